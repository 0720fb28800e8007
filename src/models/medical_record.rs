use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{RecordState, RecordType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub reference: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub record_date: NaiveDate,
    pub record_type: RecordType,
    pub diagnosis: Option<String>,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub vitals: VitalSigns,
    pub state: RecordState,
    pub notes: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalSigns {
    /// e.g. "120/80"
    pub blood_pressure: Option<String>,
    pub temperature: Option<f64>,
    pub pulse: Option<i64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}
