//! Slot validation for appointments.
//!
//! A slot is the half-open interval [start, end): two slots conflict
//! when one starts before the other ends and vice versa, so
//! back-to-back bookings (10:00-11:00 then 11:00-12:00) never collide.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::config::{CLINIC_CLOSING_HOUR, CLINIC_OPENING_HOUR};
use crate::db::repository::{appointment, doctor};
use crate::error::ClinicError;

/// A slot under validation. `appointment_id` is set on reschedule so
/// the record does not conflict with itself.
#[derive(Debug, Clone, Copy)]
pub struct ProposedSlot<'a> {
    pub appointment_id: Option<&'a Uuid>,
    pub doctor_id: &'a Uuid,
    pub date: NaiveDate,
    pub time: f64,
    pub duration: f64,
}

/// Turn a fractional-hour clock value into a datetime on the given day,
/// e.g. 14.5 -> 14:30. Minutes are rounded, so 9.1 lands on 09:06.
pub fn appointment_datetime(date: NaiveDate, time: f64) -> Result<NaiveDateTime, ClinicError> {
    if !(0.0..24.0).contains(&time) {
        return Err(ClinicError::validation(format!(
            "Invalid appointment time {time}: must be within a single day"
        )));
    }
    let hours = time.trunc() as u32;
    let minutes = ((time - time.trunc()) * 60.0).round() as u32;
    NaiveTime::from_hms_opt(hours, minutes, 0)
        .map(|t| date.and_time(t))
        .ok_or_else(|| {
            ClinicError::validation(format!("Invalid appointment time {time}"))
        })
}

/// End of a slot that starts at `start` and lasts `duration` hours.
pub fn end_datetime(start: NaiveDateTime, duration: f64) -> NaiveDateTime {
    start + Duration::minutes((duration * 60.0).round() as i64)
}

/// Validate a proposed slot against clinic rules and the doctor's
/// existing bookings, returning the resolved [start, end) on success.
///
/// Gates run in order: the start must be strictly in the future, the
/// clock value must fall inside clinic hours (closing bound exclusive),
/// the duration must be positive, and finally the doctor must be free.
/// Run this inside the same transaction that persists the slot so no
/// competing booking can slip in between check and write.
pub fn validate_slot(
    conn: &Connection,
    slot: &ProposedSlot<'_>,
    now: NaiveDateTime,
) -> Result<(NaiveDateTime, NaiveDateTime), ClinicError> {
    let start = appointment_datetime(slot.date, slot.time)?;

    if start <= now {
        return Err(ClinicError::validation(
            "Appointment date and time must be in the future!",
        ));
    }
    if slot.time < CLINIC_OPENING_HOUR || slot.time >= CLINIC_CLOSING_HOUR {
        return Err(ClinicError::validation(
            "Appointment time must be between 8:00 AM and 8:00 PM!",
        ));
    }
    if slot.duration <= 0.0 {
        return Err(ClinicError::validation(
            "Appointment duration must be greater than zero!",
        ));
    }

    let end = end_datetime(start, slot.duration);

    if let Some(reference) = appointment::first_conflicting_reference(
        conn,
        slot.doctor_id,
        &start,
        &end,
        slot.appointment_id,
    )? {
        let doctor = doctor::get_doctor(conn, slot.doctor_id)?;
        return Err(ClinicError::Conflict {
            doctor: doctor.name,
            reference,
        });
    }

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn fractional_hours_become_clock_times() {
        let d = date("2025-06-01");
        assert_eq!(
            appointment_datetime(d, 14.5).unwrap().to_string(),
            "2025-06-01 14:30:00"
        );
        assert_eq!(
            appointment_datetime(d, 8.0).unwrap().to_string(),
            "2025-06-01 08:00:00"
        );
        assert_eq!(
            appointment_datetime(d, 9.25).unwrap().to_string(),
            "2025-06-01 09:15:00"
        );
    }

    #[test]
    fn out_of_day_time_is_rejected() {
        let d = date("2025-06-01");
        assert!(appointment_datetime(d, 24.0).is_err());
        assert!(appointment_datetime(d, -1.0).is_err());
    }

    #[test]
    fn end_follows_duration_in_minutes() {
        let start = appointment_datetime(date("2025-06-01"), 10.0).unwrap();
        assert_eq!(end_datetime(start, 1.0).to_string(), "2025-06-01 11:00:00");
        assert_eq!(end_datetime(start, 0.5).to_string(), "2025-06-01 10:30:00");
        assert_eq!(end_datetime(start, 1.75).to_string(), "2025-06-01 11:45:00");
    }
}
