use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DurationUnit, MedicineType, PrescriptionState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub reference: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub prescription_date: NaiveDate,
    pub diagnosis: String,
    pub general_instructions: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub state: PrescriptionState,
    pub notes: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionLine {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub sequence: i64,
    pub medicine_name: String,
    pub medicine_type: MedicineType,
    /// e.g. "500mg", "10ml", "1 puff"
    pub dosage: String,
    pub frequency: String,
    pub duration_number: i64,
    pub duration_unit: DurationUnit,
    pub quantity: i64,
    pub timing: String,
    pub instructions: Option<String>,
    pub notes: Option<String>,
}
