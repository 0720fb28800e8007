use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentState, AppointmentType, Priority};

/// A scheduled visit. `start` and `end` are derived from
/// (`date`, `time`, `duration`) and kept in sync by the scheduling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub reference: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    /// Time of day as a fractional hour in 24h format, e.g. 14.5 for 2:30 PM.
    pub time: f64,
    /// Duration in hours.
    pub duration: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub appointment_type: AppointmentType,
    pub state: AppointmentState,
    pub priority: Priority,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub reminder_sent: bool,
    pub notes: Option<String>,
    pub active: bool,
}

impl Appointment {
    /// Cancelled and no-show appointments release their slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(
            self.state,
            AppointmentState::Cancelled | AppointmentState::NoShow
        )
    }
}
