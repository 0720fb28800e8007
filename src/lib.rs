//! Clinicore: clinic record keeping.
//!
//! Patients, doctors, appointments, billing, lab tests, medical records
//! and prescriptions, backed by SQLite. Appointment slots are validated
//! against clinic hours and per-doctor overlap; invoices derive all
//! amounts from their lines; every entity moves through a guarded state
//! machine whose transitions land in an append-only activity log.

pub mod appointment;
pub mod billing;
pub mod config;
pub mod db;
pub mod doctor;
pub mod error;
pub mod medical_record;
pub mod models;
pub mod notify;
pub mod patient;
pub mod prescription;
pub mod scheduling;

pub use error::ClinicError;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Call once at startup; the
/// filter comes from `CLINICORE_LOG` and defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("CLINICORE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::db::repository::{doctor, patient, sequence};
    use crate::models::enums::{Gender, PatientState, Priority, Specialty};
    use crate::models::{Doctor, Patient};

    pub fn seed_doctor(conn: &Connection) -> Doctor {
        seed_doctor_with_capacity(conn, 50)
    }

    pub fn seed_doctor_with_capacity(conn: &Connection, max_patients: i64) -> Doctor {
        let doc = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Grey".into(),
            specialty: Specialty::General,
            phone: None,
            email: None,
            consultation_fee: 100.0,
            max_patients,
            active: true,
        };
        doctor::insert_doctor(conn, &doc).unwrap();
        doc
    }

    pub fn seed_patient(conn: &Connection, doctor_id: Option<&Uuid>) -> Patient {
        let pat = Patient {
            id: Uuid::new_v4(),
            reference: sequence::next_reference(conn, "patient").unwrap(),
            name: "John Doe".into(),
            date_of_birth: Some(date("1990-05-20")),
            gender: Gender::Male,
            doctor_id: doctor_id.copied(),
            admission_date: date("2025-01-01"),
            state: PatientState::New,
            priority: Priority::Normal,
            notes: None,
            active: true,
        };
        patient::insert_patient(conn, &pat).unwrap();
        pat
    }

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }
}
