use chrono::Local;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;

use super::DATETIME_FMT;

/// One entry in an entity's activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditNote {
    pub note: String,
    pub created_at: String,
}

/// Append a timestamped note to an entity's activity log.
pub fn log_note(
    conn: &Connection,
    entity_type: &str,
    entity_id: &Uuid,
    note: &str,
) -> Result<(), DatabaseError> {
    let created_at = Local::now().naive_local().format(DATETIME_FMT).to_string();
    conn.execute(
        "INSERT INTO audit_log (entity_type, entity_id, note, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![entity_type, entity_id.to_string(), note, created_at],
    )?;
    Ok(())
}

/// Activity log for one entity, newest first.
pub fn notes_for(
    conn: &Connection,
    entity_type: &str,
    entity_id: &Uuid,
) -> Result<Vec<AuditNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT note, created_at FROM audit_log
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map(params![entity_type, entity_id.to_string()], |row| {
            Ok(AuditNote {
                note: row.get(0)?,
                created_at: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn notes_come_back_newest_first() {
        let conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        log_note(&conn, "appointment", &id, "Appointment created.").unwrap();
        log_note(&conn, "appointment", &id, "Appointment confirmed.").unwrap();

        let notes = notes_for(&conn, "appointment", &id).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note, "Appointment confirmed.");
        assert_eq!(notes[1].note, "Appointment created.");
    }

    #[test]
    fn notes_are_scoped_by_entity() {
        let conn = open_memory_database().unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        log_note(&conn, "billing", &a, "Billing confirmed.").unwrap();
        log_note(&conn, "billing", &b, "Billing cancelled.").unwrap();
        log_note(&conn, "appointment", &a, "Appointment created.").unwrap();

        let notes = notes_for(&conn, "billing", &a).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note, "Billing confirmed.");
    }
}
