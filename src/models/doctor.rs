use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Availability, Specialty};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: Specialty,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub consultation_fee: f64,
    pub max_patients: i64,
    pub active: bool,
}

impl Doctor {
    /// Busy once the assigned patient load reaches capacity, otherwise
    /// available. Intentionally a binary signal.
    pub fn availability(&self, patient_count: i64) -> Availability {
        if patient_count >= self.max_patients {
            Availability::Busy
        } else {
            Availability::Available
        }
    }

    pub fn at_capacity(&self, patient_count: i64) -> bool {
        self.availability(patient_count) == Availability::Busy
    }
}
