//! Embedded SQLite backend.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

use xinjie_core::config::Backend;
use xinjie_core::error::{Result, XinjieError};
use xinjie_core::types::{NewResponse, ResponseRecord};

use crate::db::Database;
use crate::queries::{Dialect, Statements};
use crate::store::ResponseStore;

/// [`ResponseStore`] over a single SQLite file.
///
/// rusqlite is blocking, so every call is moved onto tokio's blocking pool.
pub struct SqliteStore {
    db: Arc<Database>,
    statements: Arc<Statements>,
}

impl SqliteStore {
    /// Open (or create) the database file and apply migrations.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        Ok(Self::from_database(Database::new(path, busy_timeout)?))
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            statements: Arc::new(Statements::for_dialect(Dialect::Sqlite)),
        }
    }

    /// The underlying database, for direct access in tests and tooling.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &Statements) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let statements = Arc::clone(&self.statements);
        tokio::task::spawn_blocking(move || db.with_conn(|conn| f(conn, &statements)))
            .await
            .map_err(|e| XinjieError::Storage(format!("Storage task failed: {}", e)))?
    }
}

#[async_trait]
impl ResponseStore for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    async fn insert(&self, new: &NewResponse) -> Result<i64> {
        let new = new.clone();
        self.run(move |conn, stmts| {
            conn.query_row(
                &stmts.insert,
                rusqlite::params![new.prompt, new.response],
                |row| row.get(0),
            )
            .map_err(|e| XinjieError::Storage(format!("Failed to save response: {}", e)))
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ResponseRecord>> {
        self.run(move |conn, stmts| {
            conn.query_row(&stmts.select_by_id, rusqlite::params![id], row_to_record)
                .optional()
                .map_err(|e| XinjieError::Storage(format!("Failed to load response: {}", e)))
        })
        .await
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<ResponseRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.run(move |conn, stmts| {
            let mut stmt = conn
                .prepare(&stmts.select_page)
                .map_err(|e| XinjieError::Storage(format!("Page query prepare: {}", e)))?;

            let rows = stmt
                .query_map(rusqlite::params![limit, offset], row_to_record)
                .map_err(|e| XinjieError::Storage(format!("Page query: {}", e)))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|e| XinjieError::Storage(e.to_string()))?);
            }
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.run(|conn, stmts| {
            let count: i64 = conn
                .query_row(&stmts.count, [], |row| row.get(0))
                .map_err(|e| XinjieError::Storage(format!("Count query: {}", e)))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ResponseRecord> {
    let raw: String = row.get(3)?;
    let created_at = parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(ResponseRecord {
        id: row.get(0)?,
        prompt: row.get(1)?,
        response: row.get(2)?,
        created_at,
    })
}

/// Parse SQLite's `YYYY-MM-DD HH:MM:SS[.SSS]` text into UTC.
///
/// RFC 3339 is accepted too, for rows written by other tools.
fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
}
