use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{AppointmentState, AppointmentType, Priority};
use crate::models::Appointment;

use super::{parse_date, parse_datetime, parse_uuid, DATETIME_FMT};

const COLUMNS: &str = "id, reference, patient_id, doctor_id, appointment_date, \
     appointment_time, duration, start_datetime, end_datetime, appointment_type, \
     state, priority, diagnosis, prescription, reminder_sent, notes, active";

pub fn insert_appointment(
    conn: &Connection,
    appt: &Appointment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, reference, patient_id, doctor_id,
         appointment_date, appointment_time, duration, start_datetime, end_datetime,
         appointment_type, state, priority, diagnosis, prescription, reminder_sent,
         notes, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            appt.id.to_string(),
            appt.reference,
            appt.patient_id.to_string(),
            appt.doctor_id.to_string(),
            appt.date.to_string(),
            appt.time,
            appt.duration,
            appt.start.format(DATETIME_FMT).to_string(),
            appt.end.format(DATETIME_FMT).to_string(),
            appt.appointment_type.as_str(),
            appt.state.as_str(),
            appt.priority.as_str(),
            appt.diagnosis,
            appt.prescription,
            appt.reminder_sent as i32,
            appt.notes,
            appt.active as i32,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            appointment_row,
        )
        .optional()?;
    match raw {
        Some(raw) => appointment_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        }),
    }
}

pub fn get_appointment_by_reference(
    conn: &Connection,
    reference: &str,
) -> Result<Appointment, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM appointments WHERE reference = ?1"),
            params![reference],
            appointment_row,
        )
        .optional()?;
    match raw {
        Some(raw) => appointment_from_row(raw),
        None => Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: reference.into(),
        }),
    }
}

/// Persist a rescheduled slot: doctor, date, time, duration and the
/// derived start/end together, never separately.
pub fn update_schedule(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments
         SET doctor_id = ?1, appointment_date = ?2, appointment_time = ?3,
             duration = ?4, start_datetime = ?5, end_datetime = ?6
         WHERE id = ?7",
        params![
            appt.doctor_id.to_string(),
            appt.date.to_string(),
            appt.time,
            appt.duration,
            appt.start.format(DATETIME_FMT).to_string(),
            appt.end.format(DATETIME_FMT).to_string(),
            appt.id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appt.id.to_string(),
        });
    }
    Ok(())
}

pub fn set_appointment_state(
    conn: &Connection,
    id: &Uuid,
    state: AppointmentState,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET state = ?1 WHERE id = ?2",
        params![state.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_reminder_sent(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE appointments SET reminder_sent = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

/// Reference of the earliest live appointment of the same doctor whose
/// [start, end) interval overlaps the proposed one. Cancelled and
/// no-show appointments release their slot; `exclude` skips the record
/// being re-validated on mutation.
pub fn first_conflicting_reference(
    conn: &Connection,
    doctor_id: &Uuid,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    exclude: Option<&Uuid>,
) -> Result<Option<String>, DatabaseError> {
    let reference = conn
        .query_row(
            "SELECT reference FROM appointments
             WHERE doctor_id = ?1
               AND active = 1
               AND state NOT IN ('cancelled', 'no_show')
               AND id != ?2
               AND start_datetime < ?3
               AND end_datetime > ?4
             ORDER BY start_datetime
             LIMIT 1",
            params![
                doctor_id.to_string(),
                exclude.map(|id| id.to_string()).unwrap_or_default(),
                end.format(DATETIME_FMT).to_string(),
                start.format(DATETIME_FMT).to_string(),
            ],
            |row| row.get(0),
        )
        .optional()?;
    Ok(reference)
}

/// Confirmed appointments on the given date that have not been reminded
/// yet. This is the daily reminder sweep's work list.
pub fn confirmed_without_reminder(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM appointments
         WHERE appointment_date = ?1
           AND state = 'confirmed'
           AND reminder_sent = 0
           AND active = 1
         ORDER BY appointment_time"
    ))?;
    let rows = stmt.query_map(params![date.to_string()], appointment_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Soft delete.
pub fn archive_appointment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct AppointmentRow {
    id: String,
    reference: String,
    patient_id: String,
    doctor_id: String,
    date: String,
    time: f64,
    duration: f64,
    start: String,
    end: String,
    appointment_type: String,
    state: String,
    priority: String,
    diagnosis: Option<String>,
    prescription: Option<String>,
    reminder_sent: i32,
    notes: Option<String>,
    active: i32,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        reference: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        duration: row.get(6)?,
        start: row.get(7)?,
        end: row.get(8)?,
        appointment_type: row.get(9)?,
        state: row.get(10)?,
        priority: row.get(11)?,
        diagnosis: row.get(12)?,
        prescription: row.get(13)?,
        reminder_sent: row.get(14)?,
        notes: row.get(15)?,
        active: row.get(16)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: parse_uuid(&row.id)?,
        reference: row.reference,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        date: parse_date(&row.date)?,
        time: row.time,
        duration: row.duration,
        start: parse_datetime(&row.start)?,
        end: parse_datetime(&row.end)?,
        appointment_type: AppointmentType::from_str(&row.appointment_type)?,
        state: AppointmentState::from_str(&row.state)?,
        priority: Priority::from_str(&row.priority)?,
        diagnosis: row.diagnosis,
        prescription: row.prescription,
        reminder_sent: row.reminder_sent != 0,
        notes: row.notes,
        active: row.active != 0,
    })
}
