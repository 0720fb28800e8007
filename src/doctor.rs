//! Doctor registration and availability.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::doctor;
use crate::error::ClinicError;
use crate::models::enums::{Availability, Specialty};
use crate::models::Doctor;

#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: Specialty,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub consultation_fee: f64,
    pub max_patients: i64,
}

impl NewDoctor {
    pub fn new(name: impl Into<String>, specialty: Specialty) -> Self {
        Self {
            name: name.into(),
            specialty,
            phone: None,
            email: None,
            consultation_fee: 100.0,
            max_patients: 50,
        }
    }
}

pub fn create_doctor(conn: &Connection, req: &NewDoctor) -> Result<Doctor, ClinicError> {
    if req.name.trim().is_empty() {
        return Err(ClinicError::validation("Doctor name is required!"));
    }
    if req.consultation_fee < 0.0 {
        return Err(ClinicError::validation(
            "Consultation fee cannot be negative!",
        ));
    }
    if req.max_patients <= 0 {
        return Err(ClinicError::validation(
            "Maximum patients must be greater than zero!",
        ));
    }

    let doc = Doctor {
        id: Uuid::new_v4(),
        name: req.name.clone(),
        specialty: req.specialty,
        phone: req.phone.clone(),
        email: req.email.clone(),
        consultation_fee: req.consultation_fee,
        max_patients: req.max_patients,
        active: true,
    };
    doctor::insert_doctor(conn, &doc)?;
    Ok(doc)
}

/// Busy once the doctor's assigned patient load reaches capacity.
pub fn doctor_availability(conn: &Connection, id: &Uuid) -> Result<Availability, ClinicError> {
    let doc = doctor::get_doctor(conn, id)?;
    let count = doctor::patient_count(conn, id)?;
    Ok(doc.availability(count))
}
