use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Gender, PatientState, Priority};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub reference: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub doctor_id: Option<Uuid>,
    pub admission_date: NaiveDate,
    pub state: PatientState,
    pub priority: Priority,
    pub notes: Option<String>,
    pub active: bool,
}

impl Patient {
    /// Age in whole years on the given date. None when date of birth is
    /// unknown or in the future.
    pub fn age_on(&self, on: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| on.years_since(dob))
    }

    /// Under 18 on the given date. Unknown date of birth counts as adult.
    pub fn is_child_on(&self, on: NaiveDate) -> bool {
        self.age_on(on).map(|age| age < 18).unwrap_or(false)
    }
}
