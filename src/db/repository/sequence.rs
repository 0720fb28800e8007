use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

/// Draw the next human-readable reference for an entity counter,
/// e.g. `next_reference(conn, "appointment")` -> "APT00001".
///
/// Counters are seeded by migration, monotonic per code, and never
/// reused: the number is consumed even if the caller's transaction
/// later aborts for unrelated reasons within a committed scope.
pub fn next_reference(conn: &Connection, code: &str) -> Result<String, DatabaseError> {
    let row: Option<(String, i64, i64)> = conn
        .query_row(
            "SELECT prefix, padding, next_number FROM sequences WHERE code = ?1",
            params![code],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let (prefix, padding, number) = row.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Sequence".into(),
        id: code.into(),
    })?;

    conn.execute(
        "UPDATE sequences SET next_number = next_number + 1 WHERE code = ?1",
        params![code],
    )?;

    Ok(format!("{prefix}{number:0width$}", width = padding as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn references_are_monotonic() {
        let conn = open_memory_database().unwrap();
        assert_eq!(next_reference(&conn, "appointment").unwrap(), "APT00001");
        assert_eq!(next_reference(&conn, "appointment").unwrap(), "APT00002");
        assert_eq!(next_reference(&conn, "appointment").unwrap(), "APT00003");
    }

    #[test]
    fn counters_are_independent_per_code() {
        let conn = open_memory_database().unwrap();
        next_reference(&conn, "appointment").unwrap();
        next_reference(&conn, "appointment").unwrap();
        assert_eq!(next_reference(&conn, "billing").unwrap(), "BIL00001");
        assert_eq!(next_reference(&conn, "patient").unwrap(), "PAT00001");
    }

    #[test]
    fn unknown_counter_is_not_found() {
        let conn = open_memory_database().unwrap();
        let result = next_reference(&conn, "nonexistent");
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
