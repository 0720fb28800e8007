use std::path::Path;

use rusqlite::Connection;
use tracing;

use super::DatabaseError;

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/migrations/001_initial.sql"),
    )];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // schema_version + sequences + 12 entity/line tables + audit_log = 15
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 15, "Expected 15 tables, got {count}");
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        // Run migrations again, should not error
        let result = run_migrations(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn sequences_seeded_for_every_entity() {
        let conn = open_memory_database().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sequences", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn database_opens_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.db");
        let conn = open_database(&path).unwrap();
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 15);
        drop(conn);

        // Re-open, should be idempotent
        let conn2 = open_database(&path).unwrap();
        let count2 = count_tables(&conn2).unwrap();
        assert_eq!(count2, 15);
    }

    #[test]
    fn deleting_patient_cascades_to_appointments() {
        let conn = open_memory_database().unwrap();

        conn.execute(
            "INSERT INTO doctors (id, name) VALUES ('doc-1', 'Dr. Grey')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO patients (id, reference, name, admission_date)
             VALUES ('pat-1', 'PAT00001', 'John Doe', '2025-01-01')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO appointments (id, reference, patient_id, doctor_id,
             appointment_date, appointment_time, start_datetime, end_datetime)
             VALUES ('apt-1', 'APT00001', 'pat-1', 'doc-1',
             '2025-06-01', 10.0, '2025-06-01 10:00:00', '2025-06-01 11:00:00')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE id = 'pat-1'", []).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn deleting_doctor_with_appointments_is_restricted() {
        let conn = open_memory_database().unwrap();

        conn.execute(
            "INSERT INTO doctors (id, name) VALUES ('doc-1', 'Dr. Grey')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO patients (id, reference, name, admission_date)
             VALUES ('pat-1', 'PAT00001', 'John Doe', '2025-01-01')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO appointments (id, reference, patient_id, doctor_id,
             appointment_date, appointment_time, start_datetime, end_datetime)
             VALUES ('apt-1', 'APT00001', 'pat-1', 'doc-1',
             '2025-06-01', 10.0, '2025-06-01 10:00:00', '2025-06-01 11:00:00')",
            [],
        )
        .unwrap();

        let result = conn.execute("DELETE FROM doctors WHERE id = 'doc-1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn appointment_state_check_constraint() {
        let conn = open_memory_database().unwrap();

        conn.execute(
            "INSERT INTO doctors (id, name) VALUES ('doc-1', 'Dr. Grey')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO patients (id, reference, name, admission_date)
             VALUES ('pat-1', 'PAT00001', 'John Doe', '2025-01-01')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO appointments (id, reference, patient_id, doctor_id,
             appointment_date, appointment_time, start_datetime, end_datetime, state)
             VALUES ('apt-1', 'APT00001', 'pat-1', 'doc-1',
             '2025-06-01', 10.0, '2025-06-01 10:00:00', '2025-06-01 11:00:00', 'pending')",
            [],
        );
        assert!(result.is_err());
    }
}
