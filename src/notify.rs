//! Best-effort notification dispatch.
//!
//! Workflow actions never fail because a message could not be sent:
//! dispatch outcomes land in the entity's activity log and the caller
//! moves on either way.

use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::repository::audit;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("Recipient has no contact details")]
    NoRecipient,
}

/// What to say, not how to send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTemplate {
    AppointmentConfirmation,
    AppointmentReminder,
    PatientWelcome,
}

impl NotificationTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::AppointmentConfirmation => "Appointment Confirmation",
            Self::AppointmentReminder => "Appointment Reminder",
            Self::PatientWelcome => "Welcome to Our Clinic",
        }
    }
}

/// Delivery channel seam. Production wires an email or SMS gateway;
/// tests substitute recording or failing doubles.
pub trait Notifier {
    fn send(&self, template: NotificationTemplate, recipient: &str)
        -> Result<(), NotificationError>;
}

/// Default channel: writes the notification to the log instead of a
/// wire. Useful for development and as a stand-in until a gateway is
/// configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(
        &self,
        template: NotificationTemplate,
        recipient: &str,
    ) -> Result<(), NotificationError> {
        info!(subject = template.subject(), recipient, "notification sent");
        Ok(())
    }
}

/// Send a notification and record the outcome on the entity's activity
/// log. Returns whether delivery succeeded; never returns the delivery
/// error itself.
pub(crate) fn dispatch(
    conn: &Connection,
    notifier: &dyn Notifier,
    template: NotificationTemplate,
    entity_type: &str,
    entity_id: &Uuid,
    recipient: &str,
) -> Result<bool, DatabaseError> {
    match notifier.send(template, recipient) {
        Ok(()) => {
            audit::log_note(
                conn,
                entity_type,
                entity_id,
                &format!("{} sent to {}.", template.subject(), recipient),
            )?;
            Ok(true)
        }
        Err(err) => {
            warn!(
                subject = template.subject(),
                recipient,
                error = %err,
                "notification failed"
            );
            audit::log_note(
                conn,
                entity_type,
                entity_id,
                &format!("Failed to send {}: {}.", template.subject(), err),
            )?;
            Ok(false)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;

    use super::*;

    /// Records every send; optionally fails them all.
    pub struct RecordingNotifier {
        pub sent: RefCell<Vec<(NotificationTemplate, String)>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(
            &self,
            template: NotificationTemplate,
            recipient: &str,
        ) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::ChannelUnavailable("down".into()));
            }
            self.sent.borrow_mut().push((template, recipient.into()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingNotifier;
    use super::*;
    use crate::db::repository::audit::notes_for;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn log_notifier_always_delivers() {
        let result = LogNotifier.send(NotificationTemplate::AppointmentReminder, "PAT00001");
        assert!(result.is_ok());
    }

    #[test]
    fn successful_dispatch_is_audited() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::new();
        let id = Uuid::new_v4();

        let sent = dispatch(
            &conn,
            &notifier,
            NotificationTemplate::AppointmentConfirmation,
            "appointment",
            &id,
            "APT00001",
        )
        .unwrap();

        assert!(sent);
        assert_eq!(notifier.sent.borrow().len(), 1);
        let notes = notes_for(&conn, "appointment", &id).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].note.contains("Appointment Confirmation sent"));
    }

    #[test]
    fn failed_dispatch_is_audited_not_raised() {
        let conn = open_memory_database().unwrap();
        let notifier = RecordingNotifier::failing();
        let id = Uuid::new_v4();

        let sent = dispatch(
            &conn,
            &notifier,
            NotificationTemplate::PatientWelcome,
            "patient",
            &id,
            "PAT00001",
        )
        .unwrap();

        assert!(!sent);
        let notes = notes_for(&conn, "patient", &id).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].note.contains("Failed to send Welcome to Our Clinic"));
    }
}
