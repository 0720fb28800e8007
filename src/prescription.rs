//! Prescriptions.
//!
//! A prescription needs a diagnosis up front and at least one medicine
//! before it can be confirmed. It then moves confirmed -> dispensed ->
//! completed; cancellation works until the course is complete.

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{audit, prescription, sequence};
use crate::error::ClinicError;
use crate::models::enums::{DurationUnit, MedicineType, PrescriptionState};
use crate::models::{Prescription, PrescriptionLine};

#[derive(Debug, Clone)]
pub struct NewMedicineLine {
    pub medicine_name: String,
    pub medicine_type: MedicineType,
    pub dosage: String,
    pub frequency: String,
    pub duration_number: i64,
    pub duration_unit: DurationUnit,
    pub quantity: i64,
    pub timing: String,
    pub instructions: Option<String>,
}

impl NewMedicineLine {
    pub fn new(
        medicine_name: impl Into<String>,
        medicine_type: MedicineType,
        dosage: impl Into<String>,
    ) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            medicine_type,
            dosage: dosage.into(),
            frequency: "twice_daily".into(),
            duration_number: 7,
            duration_unit: DurationUnit::Days,
            quantity: 1,
            timing: "after_food".into(),
            instructions: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub diagnosis: String,
    pub general_instructions: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub lines: Vec<NewMedicineLine>,
    pub notes: Option<String>,
}

impl NewPrescription {
    pub fn new(patient_id: Uuid, doctor_id: Uuid, diagnosis: impl Into<String>) -> Self {
        Self {
            patient_id,
            doctor_id,
            appointment_id: None,
            medical_record_id: None,
            diagnosis: diagnosis.into(),
            general_instructions: None,
            follow_up_date: None,
            lines: Vec::new(),
            notes: None,
        }
    }
}

pub fn create_prescription(
    conn: &Connection,
    req: &NewPrescription,
) -> Result<Prescription, ClinicError> {
    create_prescription_on(conn, req, Local::now().date_naive())
}

pub(crate) fn create_prescription_on(
    conn: &Connection,
    req: &NewPrescription,
    prescription_date: NaiveDate,
) -> Result<Prescription, ClinicError> {
    if req.diagnosis.trim().is_empty() {
        return Err(ClinicError::validation("Diagnosis is required!"));
    }
    for line in &req.lines {
        check_line(line)?;
    }

    let tx = conn.unchecked_transaction()?;
    let rx = Prescription {
        id: Uuid::new_v4(),
        reference: sequence::next_reference(&tx, "prescription")?,
        patient_id: req.patient_id,
        doctor_id: req.doctor_id,
        appointment_id: req.appointment_id,
        medical_record_id: req.medical_record_id,
        prescription_date,
        diagnosis: req.diagnosis.clone(),
        general_instructions: req.general_instructions.clone(),
        follow_up_date: req.follow_up_date,
        state: PrescriptionState::Draft,
        notes: req.notes.clone(),
        active: true,
    };
    prescription::insert_prescription(&tx, &rx)?;
    for (i, line) in req.lines.iter().enumerate() {
        insert_line(&tx, &rx.id, (i as i64 + 1) * 10, line)?;
    }
    audit::log_note(&tx, "prescription", &rx.id, "Prescription created.")?;
    tx.commit()?;
    Ok(rx)
}

/// Medicines can only be added while the prescription is a draft.
pub fn add_medicine_line(
    conn: &Connection,
    prescription_id: &Uuid,
    line: &NewMedicineLine,
) -> Result<(), ClinicError> {
    check_line(line)?;
    let rx = prescription::get_prescription(conn, prescription_id)?;
    if rx.state != PrescriptionState::Draft {
        return Err(ClinicError::validation(
            "Medicines can only be added to a draft prescription!",
        ));
    }
    let sequence = (prescription::line_count(conn, prescription_id)? + 1) * 10;
    insert_line(conn, prescription_id, sequence, line)?;
    Ok(())
}

/// Confirm a draft prescription carrying at least one medicine.
pub fn confirm_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, ClinicError> {
    let rx = prescription::get_prescription(conn, id)?;
    if rx.state != PrescriptionState::Draft {
        return Ok(rx);
    }
    if prescription::line_count(conn, id)? == 0 {
        return Err(ClinicError::validation("Please add at least one medicine!"));
    }
    let tx = conn.unchecked_transaction()?;
    prescription::set_prescription_state(&tx, id, PrescriptionState::Confirmed)?;
    audit::log_note(&tx, "prescription", id, "Prescription confirmed.")?;
    tx.commit()?;
    prescription::get_prescription(conn, id).map_err(Into::into)
}

pub fn dispense_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, ClinicError> {
    transition(
        conn,
        id,
        PrescriptionState::Confirmed,
        PrescriptionState::Dispensed,
        "Medicines dispensed.",
    )
}

pub fn complete_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, ClinicError> {
    transition(
        conn,
        id,
        PrescriptionState::Dispensed,
        PrescriptionState::Completed,
        "Prescription completed.",
    )
}

/// Cancel unless the course already finished. Cancelling twice is a
/// no-op.
pub fn cancel_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, ClinicError> {
    let rx = prescription::get_prescription(conn, id)?;
    if matches!(
        rx.state,
        PrescriptionState::Completed | PrescriptionState::Cancelled
    ) {
        return Ok(rx);
    }
    let tx = conn.unchecked_transaction()?;
    prescription::set_prescription_state(&tx, id, PrescriptionState::Cancelled)?;
    audit::log_note(&tx, "prescription", id, "Prescription cancelled.")?;
    tx.commit()?;
    prescription::get_prescription(conn, id).map_err(Into::into)
}

/// Unconditional return to draft.
pub fn reset_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    prescription::set_prescription_state(&tx, id, PrescriptionState::Draft)?;
    audit::log_note(&tx, "prescription", id, "Prescription reset to draft.")?;
    tx.commit()?;
    prescription::get_prescription(conn, id).map_err(Into::into)
}

fn check_line(line: &NewMedicineLine) -> Result<(), ClinicError> {
    if line.medicine_name.trim().is_empty() {
        return Err(ClinicError::validation("Medicine name is required!"));
    }
    if line.duration_number <= 0 {
        return Err(ClinicError::validation(
            "Medicine duration must be greater than zero!",
        ));
    }
    if line.quantity <= 0 {
        return Err(ClinicError::validation(
            "Medicine quantity must be greater than zero!",
        ));
    }
    Ok(())
}

fn insert_line(
    conn: &Connection,
    prescription_id: &Uuid,
    sequence: i64,
    line: &NewMedicineLine,
) -> Result<(), ClinicError> {
    prescription::insert_prescription_line(
        conn,
        &PrescriptionLine {
            id: Uuid::new_v4(),
            prescription_id: *prescription_id,
            sequence,
            medicine_name: line.medicine_name.clone(),
            medicine_type: line.medicine_type,
            dosage: line.dosage.clone(),
            frequency: line.frequency.clone(),
            duration_number: line.duration_number,
            duration_unit: line.duration_unit,
            quantity: line.quantity,
            timing: line.timing.clone(),
            instructions: line.instructions.clone(),
            notes: None,
        },
    )?;
    Ok(())
}

fn transition(
    conn: &Connection,
    id: &Uuid,
    from: PrescriptionState,
    to: PrescriptionState,
    note: &str,
) -> Result<Prescription, ClinicError> {
    let rx = prescription::get_prescription(conn, id)?;
    if rx.state != from {
        return Ok(rx);
    }
    let tx = conn.unchecked_transaction()?;
    prescription::set_prescription_state(&tx, id, to)?;
    audit::log_note(&tx, "prescription", id, note)?;
    tx.commit()?;
    prescription::get_prescription(conn, id).map_err(Into::into)
}
