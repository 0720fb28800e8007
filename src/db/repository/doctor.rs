use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Specialty;
use crate::models::Doctor;

use super::parse_uuid;

const COLUMNS: &str =
    "id, name, specialty, phone, email, consultation_fee, max_patients, active";

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, name, specialty, phone, email, consultation_fee,
         max_patients, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            doctor.id.to_string(),
            doctor.name,
            doctor.specialty.as_str(),
            doctor.phone,
            doctor.email,
            doctor.consultation_fee,
            doctor.max_patients,
            doctor.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Doctor, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM doctors WHERE id = ?1"),
            params![id.to_string()],
            doctor_row,
        )
        .optional()?;
    match raw {
        Some(raw) => doctor_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        }),
    }
}

/// Active (non-archived) patients currently assigned to the doctor.
pub fn patient_count(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE doctor_id = ?1 AND active = 1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Soft delete: the doctor disappears from listings but history keeps
/// referring to them.
pub fn archive_doctor(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct DoctorRow {
    id: String,
    name: String,
    specialty: String,
    phone: Option<String>,
    email: Option<String>,
    consultation_fee: f64,
    max_patients: i64,
    active: i32,
}

fn doctor_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DoctorRow> {
    Ok(DoctorRow {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        consultation_fee: row.get(5)?,
        max_patients: row.get(6)?,
        active: row.get(7)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<Doctor, DatabaseError> {
    Ok(Doctor {
        id: parse_uuid(&row.id)?,
        name: row.name,
        specialty: Specialty::from_str(&row.specialty)?,
        phone: row.phone,
        email: row.email,
        consultation_fee: row.consultation_fee,
        max_patients: row.max_patients,
        active: row.active != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::testutil::seed_doctor;

    #[test]
    fn archive_keeps_the_row() {
        let conn = open_memory_database().unwrap();
        let doc = seed_doctor(&conn);

        archive_doctor(&conn, &doc.id).unwrap();
        let loaded = get_doctor(&conn, &doc.id).unwrap();
        assert!(!loaded.active);
        assert_eq!(loaded.name, doc.name);
    }

    #[test]
    fn missing_doctor_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = get_doctor(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
