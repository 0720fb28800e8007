//! Patient registration and care workflow.
//!
//! A patient moves new -> waiting -> consultation -> done; cancellation
//! is allowed until done. Transitions that find the record in another
//! state do nothing.

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{audit, doctor, patient, sequence};
use crate::error::ClinicError;
use crate::models::enums::{Gender, PatientState, Priority};
use crate::models::Patient;
use crate::notify::{self, NotificationTemplate, Notifier};

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub doctor_id: Option<Uuid>,
    pub priority: Priority,
    pub notes: Option<String>,
}

impl NewPatient {
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            date_of_birth: None,
            gender,
            doctor_id: None,
            priority: Priority::Normal,
            notes: None,
        }
    }
}

/// Register a patient, admitted today. A welcome message goes out on a
/// best-effort basis; its failure never blocks registration.
pub fn create_patient(
    conn: &Connection,
    notifier: &dyn Notifier,
    req: &NewPatient,
) -> Result<Patient, ClinicError> {
    create_patient_on(conn, notifier, req, Local::now().date_naive())
}

pub(crate) fn create_patient_on(
    conn: &Connection,
    notifier: &dyn Notifier,
    req: &NewPatient,
    admission_date: NaiveDate,
) -> Result<Patient, ClinicError> {
    if req.name.trim().is_empty() {
        return Err(ClinicError::validation("Patient name is required!"));
    }
    if let Some(doctor_id) = &req.doctor_id {
        check_capacity(conn, doctor_id)?;
    }

    let tx = conn.unchecked_transaction()?;
    let pat = Patient {
        id: Uuid::new_v4(),
        reference: sequence::next_reference(&tx, "patient")?,
        name: req.name.clone(),
        date_of_birth: req.date_of_birth,
        gender: req.gender,
        doctor_id: req.doctor_id,
        admission_date,
        state: PatientState::New,
        priority: req.priority,
        notes: req.notes.clone(),
        active: true,
    };
    patient::insert_patient(&tx, &pat)?;
    audit::log_note(&tx, "patient", &pat.id, "Patient registered.")?;
    notify::dispatch(
        &tx,
        notifier,
        NotificationTemplate::PatientWelcome,
        "patient",
        &pat.id,
        &pat.name,
    )?;
    tx.commit()?;
    Ok(pat)
}

fn check_capacity(conn: &Connection, doctor_id: &Uuid) -> Result<(), ClinicError> {
    let doc = doctor::get_doctor(conn, doctor_id)?;
    let count = doctor::patient_count(conn, doctor_id)?;
    if doc.at_capacity(count) {
        return Err(ClinicError::validation(format!(
            "Doctor {} cannot have more than {} patients!",
            doc.name, doc.max_patients
        )));
    }
    Ok(())
}

/// Assign or reassign the treating doctor, subject to their capacity.
pub fn assign_doctor(
    conn: &Connection,
    patient_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<(), ClinicError> {
    check_capacity(conn, doctor_id)?;
    let doc = doctor::get_doctor(conn, doctor_id)?;
    let tx = conn.unchecked_transaction()?;
    patient::set_patient_doctor(&tx, patient_id, Some(doctor_id))?;
    audit::log_note(
        &tx,
        "patient",
        patient_id,
        &format!("Assigned to {}.", doc.name),
    )?;
    tx.commit()?;
    Ok(())
}

pub fn start_waiting(conn: &Connection, id: &Uuid) -> Result<Patient, ClinicError> {
    transition(conn, id, PatientState::New, PatientState::Waiting, "Patient moved to waiting.")
}

pub fn start_consultation(conn: &Connection, id: &Uuid) -> Result<Patient, ClinicError> {
    transition(
        conn,
        id,
        PatientState::Waiting,
        PatientState::Consultation,
        "Consultation started.",
    )
}

pub fn mark_done(conn: &Connection, id: &Uuid) -> Result<Patient, ClinicError> {
    transition(
        conn,
        id,
        PatientState::Consultation,
        PatientState::Done,
        "Consultation completed.",
    )
}

/// Cancel unless treatment already finished. Cancelling a cancelled
/// patient does nothing.
pub fn cancel_patient(conn: &Connection, id: &Uuid) -> Result<Patient, ClinicError> {
    let pat = patient::get_patient(conn, id)?;
    if matches!(pat.state, PatientState::Done | PatientState::Cancelled) {
        return Ok(pat);
    }
    let tx = conn.unchecked_transaction()?;
    patient::set_patient_state(&tx, id, PatientState::Cancelled)?;
    audit::log_note(&tx, "patient", id, "Patient record cancelled.")?;
    tx.commit()?;
    patient::get_patient(conn, id).map_err(Into::into)
}

/// Unconditional return to the start of the workflow.
pub fn reset_to_new(conn: &Connection, id: &Uuid) -> Result<Patient, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    patient::set_patient_state(&tx, id, PatientState::New)?;
    audit::log_note(&tx, "patient", id, "Patient reset to new.")?;
    tx.commit()?;
    patient::get_patient(conn, id).map_err(Into::into)
}

fn transition(
    conn: &Connection,
    id: &Uuid,
    from: PatientState,
    to: PatientState,
    note: &str,
) -> Result<Patient, ClinicError> {
    let pat = patient::get_patient(conn, id)?;
    if pat.state != from {
        return Ok(pat);
    }
    let tx = conn.unchecked_transaction()?;
    patient::set_patient_state(&tx, id, to)?;
    audit::log_note(&tx, "patient", id, note)?;
    tx.commit()?;
    patient::get_patient(conn, id).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::audit::notes_for;
    use crate::db::sqlite::open_memory_database;
    use crate::notify::test_support::RecordingNotifier;
    use crate::testutil::{date, seed_doctor_with_capacity};

    #[test]
    fn registration_draws_reference_and_sends_welcome() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::new();
        let req = NewPatient::new("Jane Roe", Gender::Female);

        let pat = create_patient_on(&conn, &notifier, &req, date("2025-06-01")).unwrap();

        assert_eq!(pat.reference, "PAT00001");
        assert_eq!(pat.state, PatientState::New);
        assert_eq!(notifier.sent.borrow().len(), 1);

        let notes = notes_for(&conn, "patient", &pat.id).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].note, "Patient registered.");
    }

    #[test]
    fn failed_welcome_does_not_block_registration() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::failing();
        let req = NewPatient::new("Jane Roe", Gender::Female);

        let pat = create_patient_on(&conn, &notifier, &req, date("2025-06-01")).unwrap();
        let notes = notes_for(&conn, "patient", &pat.id).unwrap();
        assert!(notes[0].note.starts_with("Failed to send"));
    }

    #[test]
    fn doctor_capacity_blocks_registration() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::new();
        let doc = seed_doctor_with_capacity(&conn, 1);

        let mut req = NewPatient::new("First", Gender::Male);
        req.doctor_id = Some(doc.id);
        create_patient_on(&conn, &notifier, &req, date("2025-06-01")).unwrap();

        let mut req2 = NewPatient::new("Second", Gender::Female);
        req2.doctor_id = Some(doc.id);
        let err = create_patient_on(&conn, &notifier, &req2, date("2025-06-01")).unwrap_err();
        assert!(err.to_string().contains("cannot have more than 1 patients"));
    }

    #[test]
    fn assignment_respects_capacity_and_is_audited() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::new();
        let doc = seed_doctor_with_capacity(&conn, 1);

        let req = NewPatient::new("Jane Roe", Gender::Female);
        let pat = create_patient_on(&conn, &notifier, &req, date("2025-06-01")).unwrap();
        assign_doctor(&conn, &pat.id, &doc.id).unwrap();

        let notes = notes_for(&conn, "patient", &pat.id).unwrap();
        assert!(notes[0].note.contains(&doc.name));

        let other = create_patient_on(
            &conn,
            &notifier,
            &NewPatient::new("Late Comer", Gender::Male),
            date("2025-06-01"),
        )
        .unwrap();
        let err = assign_doctor(&conn, &other.id, &doc.id).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn workflow_walks_forward_and_ignores_out_of_order_calls() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::new();
        let req = NewPatient::new("Jane Roe", Gender::Female);
        let pat = create_patient_on(&conn, &notifier, &req, date("2025-06-01")).unwrap();

        // done before consultation: silently ignored
        assert_eq!(mark_done(&conn, &pat.id).unwrap().state, PatientState::New);

        assert_eq!(start_waiting(&conn, &pat.id).unwrap().state, PatientState::Waiting);
        assert_eq!(
            start_consultation(&conn, &pat.id).unwrap().state,
            PatientState::Consultation
        );
        assert_eq!(mark_done(&conn, &pat.id).unwrap().state, PatientState::Done);

        // cancel after done: no-op
        assert_eq!(cancel_patient(&conn, &pat.id).unwrap().state, PatientState::Done);

        assert_eq!(reset_to_new(&conn, &pat.id).unwrap().state, PatientState::New);
    }
}
