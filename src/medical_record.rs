//! Medical records.
//!
//! A record is drafted during the visit, confirmed once final, and
//! archived when it leaves active use. Resetting to draft is always
//! allowed so a confirmed record can be corrected.

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{audit, medical_record, sequence};
use crate::error::ClinicError;
use crate::models::enums::{RecordState, RecordType};
use crate::models::{MedicalRecord, VitalSigns};

#[derive(Debug, Clone)]
pub struct NewMedicalRecord {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub record_type: RecordType,
    pub diagnosis: Option<String>,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub vitals: VitalSigns,
    pub notes: Option<String>,
}

impl NewMedicalRecord {
    pub fn new(patient_id: Uuid, doctor_id: Uuid, record_type: RecordType) -> Self {
        Self {
            patient_id,
            doctor_id,
            appointment_id: None,
            record_type,
            diagnosis: None,
            symptoms: None,
            treatment: None,
            vitals: VitalSigns::default(),
            notes: None,
        }
    }
}

pub fn create_medical_record(
    conn: &Connection,
    req: &NewMedicalRecord,
) -> Result<MedicalRecord, ClinicError> {
    create_medical_record_on(conn, req, Local::now().date_naive())
}

pub(crate) fn create_medical_record_on(
    conn: &Connection,
    req: &NewMedicalRecord,
    record_date: NaiveDate,
) -> Result<MedicalRecord, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    let record = MedicalRecord {
        id: Uuid::new_v4(),
        reference: sequence::next_reference(&tx, "medical_record")?,
        patient_id: req.patient_id,
        doctor_id: req.doctor_id,
        appointment_id: req.appointment_id,
        record_date,
        record_type: req.record_type,
        diagnosis: req.diagnosis.clone(),
        symptoms: req.symptoms.clone(),
        treatment: req.treatment.clone(),
        vitals: req.vitals.clone(),
        state: RecordState::Draft,
        notes: req.notes.clone(),
        active: true,
    };
    medical_record::insert_medical_record(&tx, &record)?;
    audit::log_note(&tx, "medical_record", &record.id, "Medical record created.")?;
    tx.commit()?;
    Ok(record)
}

pub fn confirm_record(conn: &Connection, id: &Uuid) -> Result<MedicalRecord, ClinicError> {
    transition(
        conn,
        id,
        RecordState::Draft,
        RecordState::Confirmed,
        "Medical record confirmed.",
    )
}

pub fn archive_record(conn: &Connection, id: &Uuid) -> Result<MedicalRecord, ClinicError> {
    transition(
        conn,
        id,
        RecordState::Confirmed,
        RecordState::Archived,
        "Medical record archived.",
    )
}

/// Unconditional return to draft.
pub fn reset_record(conn: &Connection, id: &Uuid) -> Result<MedicalRecord, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    medical_record::set_record_state(&tx, id, RecordState::Draft)?;
    audit::log_note(&tx, "medical_record", id, "Medical record reset to draft.")?;
    tx.commit()?;
    medical_record::get_medical_record(conn, id).map_err(Into::into)
}

fn transition(
    conn: &Connection,
    id: &Uuid,
    from: RecordState,
    to: RecordState,
    note: &str,
) -> Result<MedicalRecord, ClinicError> {
    let record = medical_record::get_medical_record(conn, id)?;
    if record.state != from {
        return Ok(record);
    }
    let tx = conn.unchecked_transaction()?;
    medical_record::set_record_state(&tx, id, to)?;
    audit::log_note(&tx, "medical_record", id, note)?;
    tx.commit()?;
    medical_record::get_medical_record(conn, id).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::testutil::{date, seed_doctor, seed_patient};

    fn drafted(conn: &Connection) -> MedicalRecord {
        let doc = seed_doctor(conn);
        let pat = seed_patient(conn, None);
        let mut req = NewMedicalRecord::new(pat.id, doc.id, RecordType::Consultation);
        req.diagnosis = Some("Seasonal flu".into());
        req.vitals = VitalSigns {
            blood_pressure: Some("120/80".into()),
            temperature: Some(38.2),
            pulse: Some(88),
            weight: Some(72.0),
            height: Some(178.0),
        };
        create_medical_record_on(conn, &req, date("2025-06-01")).unwrap()
    }

    #[test]
    fn record_round_trips_with_vitals() {
        let conn = open_memory_database().unwrap();
        let record = drafted(&conn);
        assert_eq!(record.reference, "MRC00001");

        let loaded = medical_record::get_medical_record(&conn, &record.id).unwrap();
        assert_eq!(loaded.vitals.blood_pressure.as_deref(), Some("120/80"));
        assert_eq!(loaded.vitals.temperature, Some(38.2));
        assert_eq!(loaded.diagnosis.as_deref(), Some("Seasonal flu"));
    }

    #[test]
    fn lifecycle_is_guarded() {
        let conn = open_memory_database().unwrap();
        let record = drafted(&conn);

        // cannot archive a draft
        assert_eq!(
            archive_record(&conn, &record.id).unwrap().state,
            RecordState::Draft
        );
        assert_eq!(
            confirm_record(&conn, &record.id).unwrap().state,
            RecordState::Confirmed
        );
        // confirming twice does nothing
        assert_eq!(
            confirm_record(&conn, &record.id).unwrap().state,
            RecordState::Confirmed
        );
        assert_eq!(
            archive_record(&conn, &record.id).unwrap().state,
            RecordState::Archived
        );
        assert_eq!(
            reset_record(&conn, &record.id).unwrap().state,
            RecordState::Draft
        );
    }
}
