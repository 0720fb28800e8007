use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{Gender, PatientState, Priority};
use crate::models::Patient;

use super::{parse_date, parse_opt_date, parse_opt_uuid, parse_uuid};

const COLUMNS: &str = "id, reference, name, date_of_birth, gender, doctor_id, \
     admission_date, state, priority, notes, active";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, reference, name, date_of_birth, gender, doctor_id,
         admission_date, state, priority, notes, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient.id.to_string(),
            patient.reference,
            patient.name,
            patient.date_of_birth.map(|d| d.to_string()),
            patient.gender.as_str(),
            patient.doctor_id.map(|id| id.to_string()),
            patient.admission_date.to_string(),
            patient.state.as_str(),
            patient.priority.as_str(),
            patient.notes,
            patient.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Patient, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM patients WHERE id = ?1"),
            params![id.to_string()],
            patient_row,
        )
        .optional()?;
    match raw {
        Some(raw) => patient_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        }),
    }
}

pub fn set_patient_state(
    conn: &Connection,
    id: &Uuid,
    state: PatientState,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE patients SET state = ?1 WHERE id = ?2",
        params![state.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_patient_doctor(
    conn: &Connection,
    id: &Uuid,
    doctor_id: Option<&Uuid>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE patients SET doctor_id = ?1 WHERE id = ?2",
        params![doctor_id.map(|d| d.to_string()), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Soft delete. The reference stays consumed; the row stays for history.
pub fn archive_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE patients SET active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct PatientRow {
    id: String,
    reference: String,
    name: String,
    date_of_birth: Option<String>,
    gender: String,
    doctor_id: Option<String>,
    admission_date: String,
    state: String,
    priority: String,
    notes: Option<String>,
    active: i32,
}

fn patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        reference: row.get(1)?,
        name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        doctor_id: row.get(5)?,
        admission_date: row.get(6)?,
        state: row.get(7)?,
        priority: row.get(8)?,
        notes: row.get(9)?,
        active: row.get(10)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        reference: row.reference,
        name: row.name,
        date_of_birth: parse_opt_date(row.date_of_birth),
        gender: Gender::from_str(&row.gender)?,
        doctor_id: parse_opt_uuid(row.doctor_id),
        admission_date: parse_date(&row.admission_date)?,
        state: PatientState::from_str(&row.state)?,
        priority: Priority::from_str(&row.priority)?,
        notes: row.notes,
        active: row.active != 0,
    })
}
