use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{RecordState, RecordType};
use crate::models::{MedicalRecord, VitalSigns};

use super::{parse_date, parse_opt_uuid, parse_uuid};

const COLUMNS: &str = "id, reference, patient_id, doctor_id, appointment_id, \
     record_date, record_type, diagnosis, symptoms, treatment, blood_pressure, \
     temperature, pulse, weight, height, state, notes, active";

pub fn insert_medical_record(
    conn: &Connection,
    record: &MedicalRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medical_records (id, reference, patient_id, doctor_id,
         appointment_id, record_date, record_type, diagnosis, symptoms, treatment,
         blood_pressure, temperature, pulse, weight, height, state, notes, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                 ?16, ?17, ?18)",
        params![
            record.id.to_string(),
            record.reference,
            record.patient_id.to_string(),
            record.doctor_id.to_string(),
            record.appointment_id.map(|id| id.to_string()),
            record.record_date.to_string(),
            record.record_type.as_str(),
            record.diagnosis,
            record.symptoms,
            record.treatment,
            record.vitals.blood_pressure,
            record.vitals.temperature,
            record.vitals.pulse,
            record.vitals.weight,
            record.vitals.height,
            record.state.as_str(),
            record.notes,
            record.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_medical_record(conn: &Connection, id: &Uuid) -> Result<MedicalRecord, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM medical_records WHERE id = ?1"),
            params![id.to_string()],
            record_row,
        )
        .optional()?;
    match raw {
        Some(raw) => record_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "MedicalRecord".into(),
            id: id.to_string(),
        }),
    }
}

pub fn set_record_state(
    conn: &Connection,
    id: &Uuid,
    state: RecordState,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medical_records SET state = ?1 WHERE id = ?2",
        params![state.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "MedicalRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct RecordRow {
    id: String,
    reference: String,
    patient_id: String,
    doctor_id: String,
    appointment_id: Option<String>,
    record_date: String,
    record_type: String,
    diagnosis: Option<String>,
    symptoms: Option<String>,
    treatment: Option<String>,
    blood_pressure: Option<String>,
    temperature: Option<f64>,
    pulse: Option<i64>,
    weight: Option<f64>,
    height: Option<f64>,
    state: String,
    notes: Option<String>,
    active: i32,
}

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        reference: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        appointment_id: row.get(4)?,
        record_date: row.get(5)?,
        record_type: row.get(6)?,
        diagnosis: row.get(7)?,
        symptoms: row.get(8)?,
        treatment: row.get(9)?,
        blood_pressure: row.get(10)?,
        temperature: row.get(11)?,
        pulse: row.get(12)?,
        weight: row.get(13)?,
        height: row.get(14)?,
        state: row.get(15)?,
        notes: row.get(16)?,
        active: row.get(17)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<MedicalRecord, DatabaseError> {
    Ok(MedicalRecord {
        id: parse_uuid(&row.id)?,
        reference: row.reference,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        appointment_id: parse_opt_uuid(row.appointment_id),
        record_date: parse_date(&row.record_date)?,
        record_type: RecordType::from_str(&row.record_type)?,
        diagnosis: row.diagnosis,
        symptoms: row.symptoms,
        treatment: row.treatment,
        vitals: VitalSigns {
            blood_pressure: row.blood_pressure,
            temperature: row.temperature,
            pulse: row.pulse,
            weight: row.weight,
            height: row.height,
        },
        state: RecordState::from_str(&row.state)?,
        notes: row.notes,
        active: row.active != 0,
    })
}
