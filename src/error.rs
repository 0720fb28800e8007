use thiserror::Error;

use crate::db::DatabaseError;

/// Domain errors surfaced by validators and workflow actions.
///
/// Validation and conflict errors block the write; store errors pass
/// through. Guarded transitions that find a record in the wrong state
/// are silent no-ops, not errors.
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Doctor {doctor} is not available at this time. Conflicting appointment: {reference}")]
    Conflict { doctor: String, reference: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ClinicError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<rusqlite::Error> for ClinicError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(err))
    }
}
