//! Database schema migrations.
//!
//! Both backends track applied versions in a `schema_migrations` table and
//! create the `responses` table in version 1. Migrations are applied when a
//! store is opened, never per request.

use rusqlite::Connection;
use sqlx::PgPool;
use tracing::info;

use xinjie_core::error::XinjieError;

/// Latest schema version known to this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Run all pending SQLite migrations.
pub fn run_sqlite_migrations(conn: &Connection) -> Result<(), XinjieError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| XinjieError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| XinjieError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_sqlite_v1(conn)?;
        info!(backend = "sqlite", "Applied migration v1: responses");
    }

    Ok(())
}

/// Version 1: the responses table.
///
/// `created_at` keeps millisecond precision so that history ordering is
/// stable for rows inserted within the same second.
fn apply_sqlite_v1(conn: &Connection) -> Result<(), XinjieError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS responses (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            prompt      TEXT NOT NULL,
            response    TEXT NOT NULL,
            created_at  DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_responses_created_at
            ON responses (created_at DESC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'responses');
        ",
    )
    .map_err(|e| XinjieError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

/// Run all pending PostgreSQL migrations inside one transaction.
pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), XinjieError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| XinjieError::Storage(format!("Failed to begin migration: {}", e)))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     BIGINT PRIMARY KEY,
            name        TEXT NOT NULL,
            applied_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(&mut *tx)
    .await
    .map_err(|e| XinjieError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(version), 0)::BIGINT FROM schema_migrations")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                XinjieError::Storage(format!("Failed to query migration version: {}", e))
            })?;

    if current_version < 1 {
        for statement in [
            "CREATE TABLE IF NOT EXISTS responses (
                id          BIGSERIAL PRIMARY KEY,
                prompt      TEXT NOT NULL,
                response    TEXT NOT NULL,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE INDEX IF NOT EXISTS idx_responses_created_at
                ON responses (created_at DESC)",
            "INSERT INTO schema_migrations (version, name) VALUES (1, 'responses')
                ON CONFLICT (version) DO NOTHING",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    XinjieError::Storage(format!("Failed to apply migration v1: {}", e))
                })?;
        }
        info!(backend = "postgres", "Applied migration v1: responses");
    }

    tx.commit()
        .await
        .map_err(|e| XinjieError::Storage(format!("Failed to commit migration: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_sqlite_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_sqlite_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_responses_defaults() {
        let conn = open_test_conn();
        run_sqlite_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO responses (prompt, response) VALUES ('月', '<svg>月</svg>')",
            [],
        )
        .unwrap();

        let (id, created_at): (i64, String) = conn
            .query_row("SELECT id, created_at FROM responses", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(id, 1);
        // e.g. "2024-09-10 08:15:42.123"
        assert_eq!(created_at.len(), 23);
    }

    #[test]
    fn test_prompt_and_response_not_null() {
        let conn = open_test_conn();
        run_sqlite_migrations(&conn).unwrap();

        let missing_response =
            conn.execute("INSERT INTO responses (prompt) VALUES ('山')", []);
        assert!(missing_response.is_err());

        let missing_prompt =
            conn.execute("INSERT INTO responses (response) VALUES ('<svg/>')", []);
        assert!(missing_prompt.is_err());
    }

    #[test]
    fn test_autoincrement_never_reuses_ids() {
        let conn = open_test_conn();
        run_sqlite_migrations(&conn).unwrap();

        conn.execute("INSERT INTO responses (prompt, response) VALUES ('a', 'x')", [])
            .unwrap();
        conn.execute("DELETE FROM responses", []).unwrap();
        conn.execute("INSERT INTO responses (prompt, response) VALUES ('b', 'y')", [])
            .unwrap();

        let id: i64 = conn
            .query_row("SELECT id FROM responses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, 2);
    }
}
