use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{DurationUnit, MedicineType, PrescriptionState};
use crate::models::{Prescription, PrescriptionLine};

use super::{parse_date, parse_opt_date, parse_opt_uuid, parse_uuid};

const COLUMNS: &str = "id, reference, patient_id, doctor_id, appointment_id, \
     medical_record_id, prescription_date, diagnosis, general_instructions, \
     follow_up_date, state, notes, active";

pub fn insert_prescription(
    conn: &Connection,
    prescription: &Prescription,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (id, reference, patient_id, doctor_id,
         appointment_id, medical_record_id, prescription_date, diagnosis,
         general_instructions, follow_up_date, state, notes, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            prescription.id.to_string(),
            prescription.reference,
            prescription.patient_id.to_string(),
            prescription.doctor_id.to_string(),
            prescription.appointment_id.map(|id| id.to_string()),
            prescription.medical_record_id.map(|id| id.to_string()),
            prescription.prescription_date.to_string(),
            prescription.diagnosis,
            prescription.general_instructions,
            prescription.follow_up_date.map(|d| d.to_string()),
            prescription.state.as_str(),
            prescription.notes,
            prescription.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM prescriptions WHERE id = ?1"),
            params![id.to_string()],
            prescription_row,
        )
        .optional()?;
    match raw {
        Some(raw) => prescription_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "Prescription".into(),
            id: id.to_string(),
        }),
    }
}

pub fn set_prescription_state(
    conn: &Connection,
    id: &Uuid,
    state: PrescriptionState,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE prescriptions SET state = ?1 WHERE id = ?2",
        params![state.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Prescription".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn insert_prescription_line(
    conn: &Connection,
    line: &PrescriptionLine,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescription_lines (id, prescription_id, sequence, medicine_name,
         medicine_type, dosage, frequency, duration_number, duration_unit, quantity,
         timing, instructions, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            line.id.to_string(),
            line.prescription_id.to_string(),
            line.sequence,
            line.medicine_name,
            line.medicine_type.as_str(),
            line.dosage,
            line.frequency,
            line.duration_number,
            line.duration_unit.as_str(),
            line.quantity,
            line.timing,
            line.instructions,
            line.notes,
        ],
    )?;
    Ok(())
}

pub fn prescription_lines(
    conn: &Connection,
    prescription_id: &Uuid,
) -> Result<Vec<PrescriptionLine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, prescription_id, sequence, medicine_name, medicine_type, dosage,
                frequency, duration_number, duration_unit, quantity, timing,
                instructions, notes
         FROM prescription_lines WHERE prescription_id = ?1
         ORDER BY sequence, id",
    )?;
    let rows = stmt.query_map(params![prescription_id.to_string()], line_row)?;

    let mut lines = Vec::new();
    for row in rows {
        lines.push(line_from_row(row?)?);
    }
    Ok(lines)
}

pub fn line_count(conn: &Connection, prescription_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM prescription_lines WHERE prescription_id = ?1",
        params![prescription_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct PrescriptionRow {
    id: String,
    reference: String,
    patient_id: String,
    doctor_id: String,
    appointment_id: Option<String>,
    medical_record_id: Option<String>,
    prescription_date: String,
    diagnosis: String,
    general_instructions: Option<String>,
    follow_up_date: Option<String>,
    state: String,
    notes: Option<String>,
    active: i32,
}

fn prescription_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        reference: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        appointment_id: row.get(4)?,
        medical_record_id: row.get(5)?,
        prescription_date: row.get(6)?,
        diagnosis: row.get(7)?,
        general_instructions: row.get(8)?,
        follow_up_date: row.get(9)?,
        state: row.get(10)?,
        notes: row.get(11)?,
        active: row.get(12)?,
    })
}

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    Ok(Prescription {
        id: parse_uuid(&row.id)?,
        reference: row.reference,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        appointment_id: parse_opt_uuid(row.appointment_id),
        medical_record_id: parse_opt_uuid(row.medical_record_id),
        prescription_date: parse_date(&row.prescription_date)?,
        diagnosis: row.diagnosis,
        general_instructions: row.general_instructions,
        follow_up_date: parse_opt_date(row.follow_up_date),
        state: PrescriptionState::from_str(&row.state)?,
        notes: row.notes,
        active: row.active != 0,
    })
}

struct LineRow {
    id: String,
    prescription_id: String,
    sequence: i64,
    medicine_name: String,
    medicine_type: String,
    dosage: String,
    frequency: String,
    duration_number: i64,
    duration_unit: String,
    quantity: i64,
    timing: String,
    instructions: Option<String>,
    notes: Option<String>,
}

fn line_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LineRow> {
    Ok(LineRow {
        id: row.get(0)?,
        prescription_id: row.get(1)?,
        sequence: row.get(2)?,
        medicine_name: row.get(3)?,
        medicine_type: row.get(4)?,
        dosage: row.get(5)?,
        frequency: row.get(6)?,
        duration_number: row.get(7)?,
        duration_unit: row.get(8)?,
        quantity: row.get(9)?,
        timing: row.get(10)?,
        instructions: row.get(11)?,
        notes: row.get(12)?,
    })
}

fn line_from_row(row: LineRow) -> Result<PrescriptionLine, DatabaseError> {
    Ok(PrescriptionLine {
        id: parse_uuid(&row.id)?,
        prescription_id: parse_uuid(&row.prescription_id)?,
        sequence: row.sequence,
        medicine_name: row.medicine_name,
        medicine_type: MedicineType::from_str(&row.medicine_type)?,
        dosage: row.dosage,
        frequency: row.frequency,
        duration_number: row.duration_number,
        duration_unit: DurationUnit::from_str(&row.duration_unit)?,
        quantity: row.quantity,
        timing: row.timing,
        instructions: row.instructions,
        notes: row.notes,
    })
}
