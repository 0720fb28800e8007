//! Appointment booking and workflow.
//!
//! Booking validates the slot and writes the record in one transaction,
//! so two competing bookings for the same doctor cannot both pass the
//! overlap check. The workflow runs draft -> confirmed -> arrived ->
//! in_progress -> done, with cancelled and no_show as exits; an action
//! called in the wrong state does nothing.

use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use crate::config::{DEFAULT_APPOINTMENT_DURATION, EMERGENCY_APPOINTMENT_DURATION};
use crate::db::repository::{appointment, audit, patient, sequence};
use crate::error::ClinicError;
use crate::models::enums::{AppointmentState, AppointmentType, PatientState, Priority};
use crate::models::Appointment;
use crate::notify::{self, NotificationTemplate, Notifier};
use crate::scheduling::{self, ProposedSlot};

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    /// Fractional hour, e.g. 14.5 for 2:30 PM.
    pub time: f64,
    /// Duration in hours.
    pub duration: f64,
    pub appointment_type: AppointmentType,
    pub priority: Priority,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn new(patient_id: Uuid, doctor_id: Uuid, date: NaiveDate, time: f64) -> Self {
        Self {
            patient_id,
            doctor_id,
            date,
            time,
            duration: DEFAULT_APPOINTMENT_DURATION,
            appointment_type: AppointmentType::Consultation,
            priority: Priority::Normal,
            notes: None,
        }
    }

    /// Emergency booking: half-length slot, highest priority.
    pub fn emergency(patient_id: Uuid, doctor_id: Uuid, date: NaiveDate, time: f64) -> Self {
        Self {
            duration: EMERGENCY_APPOINTMENT_DURATION,
            appointment_type: AppointmentType::Emergency,
            priority: Priority::VeryHigh,
            ..Self::new(patient_id, doctor_id, date, time)
        }
    }
}

pub fn create_appointment(
    conn: &Connection,
    req: &NewAppointment,
) -> Result<Appointment, ClinicError> {
    create_appointment_at(conn, req, Local::now().naive_local())
}

pub(crate) fn create_appointment_at(
    conn: &Connection,
    req: &NewAppointment,
    now: NaiveDateTime,
) -> Result<Appointment, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    let slot = ProposedSlot {
        appointment_id: None,
        doctor_id: &req.doctor_id,
        date: req.date,
        time: req.time,
        duration: req.duration,
    };
    let (start, end) = scheduling::validate_slot(&tx, &slot, now)?;

    let appt = Appointment {
        id: Uuid::new_v4(),
        reference: sequence::next_reference(&tx, "appointment")?,
        patient_id: req.patient_id,
        doctor_id: req.doctor_id,
        date: req.date,
        time: req.time,
        duration: req.duration,
        start,
        end,
        appointment_type: req.appointment_type,
        state: AppointmentState::Draft,
        priority: req.priority,
        diagnosis: None,
        prescription: None,
        reminder_sent: false,
        notes: req.notes.clone(),
        active: true,
    };
    appointment::insert_appointment(&tx, &appt)?;
    audit::log_note(&tx, "appointment", &appt.id, "Appointment created.")?;
    tx.commit()?;
    Ok(appt)
}

/// Move a draft or confirmed appointment to a new slot, revalidating it
/// against everyone else's bookings but not its own.
pub fn reschedule_appointment(
    conn: &Connection,
    id: &Uuid,
    date: NaiveDate,
    time: f64,
    duration: f64,
) -> Result<Appointment, ClinicError> {
    reschedule_appointment_at(conn, id, date, time, duration, Local::now().naive_local())
}

pub(crate) fn reschedule_appointment_at(
    conn: &Connection,
    id: &Uuid,
    date: NaiveDate,
    time: f64,
    duration: f64,
    now: NaiveDateTime,
) -> Result<Appointment, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    let mut appt = appointment::get_appointment(&tx, id)?;
    if !matches!(
        appt.state,
        AppointmentState::Draft | AppointmentState::Confirmed
    ) {
        return Err(ClinicError::validation(
            "Only draft or confirmed appointments can be rescheduled!",
        ));
    }

    let slot = ProposedSlot {
        appointment_id: Some(id),
        doctor_id: &appt.doctor_id,
        date,
        time,
        duration,
    };
    let (start, end) = scheduling::validate_slot(&tx, &slot, now)?;

    appt.date = date;
    appt.time = time;
    appt.duration = duration;
    appt.start = start;
    appt.end = end;
    appointment::update_schedule(&tx, &appt)?;
    audit::log_note(
        &tx,
        "appointment",
        id,
        &format!("Appointment rescheduled to {start}."),
    )?;
    tx.commit()?;
    Ok(appt)
}

/// Confirm a draft appointment and notify the patient. Delivery failure
/// is logged on the appointment, never raised.
pub fn confirm_appointment(
    conn: &Connection,
    notifier: &dyn Notifier,
    id: &Uuid,
) -> Result<Appointment, ClinicError> {
    let appt = appointment::get_appointment(conn, id)?;
    if appt.state != AppointmentState::Draft {
        return Ok(appt);
    }
    let tx = conn.unchecked_transaction()?;
    appointment::set_appointment_state(&tx, id, AppointmentState::Confirmed)?;
    audit::log_note(&tx, "appointment", id, "Appointment confirmed.")?;
    let pat = patient::get_patient(&tx, &appt.patient_id)?;
    notify::dispatch(
        &tx,
        notifier,
        NotificationTemplate::AppointmentConfirmation,
        "appointment",
        id,
        &pat.name,
    )?;
    tx.commit()?;
    appointment::get_appointment(conn, id).map_err(Into::into)
}

pub fn mark_arrived(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    transition(
        conn,
        id,
        AppointmentState::Confirmed,
        AppointmentState::Arrived,
        "Patient arrived.",
    )
}

pub fn start_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    transition(
        conn,
        id,
        AppointmentState::Arrived,
        AppointmentState::InProgress,
        "Consultation in progress.",
    )
}

/// Finish the visit. If the patient is mid-consultation their own
/// workflow completes with it.
pub fn complete_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    let appt = appointment::get_appointment(conn, id)?;
    if appt.state != AppointmentState::InProgress {
        return Ok(appt);
    }
    let tx = conn.unchecked_transaction()?;
    appointment::set_appointment_state(&tx, id, AppointmentState::Done)?;
    audit::log_note(&tx, "appointment", id, "Appointment completed.")?;

    let pat = patient::get_patient(&tx, &appt.patient_id)?;
    if pat.state == PatientState::Consultation {
        patient::set_patient_state(&tx, &pat.id, PatientState::Done)?;
        audit::log_note(&tx, "patient", &pat.id, "Consultation completed.")?;
    }
    tx.commit()?;
    appointment::get_appointment(conn, id).map_err(Into::into)
}

/// Cancel unless the visit already happened. Cancelling twice is a
/// no-op, not an error.
pub fn cancel_appointment(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    let appt = appointment::get_appointment(conn, id)?;
    if matches!(
        appt.state,
        AppointmentState::Done | AppointmentState::Cancelled
    ) {
        return Ok(appt);
    }
    let tx = conn.unchecked_transaction()?;
    appointment::set_appointment_state(&tx, id, AppointmentState::Cancelled)?;
    audit::log_note(&tx, "appointment", id, "Appointment cancelled.")?;
    tx.commit()?;
    appointment::get_appointment(conn, id).map_err(Into::into)
}

/// Only a confirmed appointment can be a no-show.
pub fn mark_no_show(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    transition(
        conn,
        id,
        AppointmentState::Confirmed,
        AppointmentState::NoShow,
        "Patient did not show up.",
    )
}

/// Unconditional return to draft.
pub fn reset_to_draft(conn: &Connection, id: &Uuid) -> Result<Appointment, ClinicError> {
    let tx = conn.unchecked_transaction()?;
    appointment::set_appointment_state(&tx, id, AppointmentState::Draft)?;
    audit::log_note(&tx, "appointment", id, "Appointment reset to draft.")?;
    tx.commit()?;
    appointment::get_appointment(conn, id).map_err(Into::into)
}

/// Daily sweep: remind patients of tomorrow's confirmed appointments.
/// Returns how many reminders went out; appointments whose delivery
/// failed stay unmarked and are retried on the next run.
pub fn run_daily_reminders(
    conn: &Connection,
    notifier: &dyn Notifier,
) -> Result<usize, ClinicError> {
    run_reminders_for(conn, notifier, Local::now().date_naive() + chrono::Duration::days(1))
}

pub fn run_reminders_for(
    conn: &Connection,
    notifier: &dyn Notifier,
    date: NaiveDate,
) -> Result<usize, ClinicError> {
    let due = appointment::confirmed_without_reminder(conn, date)?;
    let mut sent = 0;
    for appt in &due {
        let pat = patient::get_patient(conn, &appt.patient_id)?;
        let delivered = notify::dispatch(
            conn,
            notifier,
            NotificationTemplate::AppointmentReminder,
            "appointment",
            &appt.id,
            &pat.name,
        )?;
        if delivered {
            appointment::set_reminder_sent(conn, &appt.id)?;
            sent += 1;
        }
    }
    if sent > 0 {
        info!(date = %date, sent, "appointment reminders dispatched");
    }
    Ok(sent)
}

fn transition(
    conn: &Connection,
    id: &Uuid,
    from: AppointmentState,
    to: AppointmentState,
    note: &str,
) -> Result<Appointment, ClinicError> {
    let appt = appointment::get_appointment(conn, id)?;
    if appt.state != from {
        return Ok(appt);
    }
    let tx = conn.unchecked_transaction()?;
    appointment::set_appointment_state(&tx, id, to)?;
    audit::log_note(&tx, "appointment", id, note)?;
    tx.commit()?;
    appointment::get_appointment(conn, id).map_err(Into::into)
}
