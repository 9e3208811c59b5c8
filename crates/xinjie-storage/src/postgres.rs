//! Hosted PostgreSQL backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use xinjie_core::config::Backend;
use xinjie_core::error::{Result, XinjieError};
use xinjie_core::types::{NewResponse, ResponseRecord};

use crate::migrations;
use crate::queries::{Dialect, Statements};
use crate::store::ResponseStore;

#[derive(Debug, sqlx::FromRow)]
struct ResponseRow {
    id: i64,
    prompt: String,
    response: String,
    created_at: DateTime<Utc>,
}

impl From<ResponseRow> for ResponseRecord {
    fn from(row: ResponseRow) -> Self {
        ResponseRecord {
            id: row.id,
            prompt: row.prompt,
            response: row.response,
            created_at: row.created_at,
        }
    }
}

/// [`ResponseStore`] over a pooled PostgreSQL connection.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    statements: Statements,
}

impl PostgresStore {
    /// Connect, size the pool, and apply migrations.
    pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| XinjieError::Storage(format!("Failed to connect to postgres: {}", e)))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool. Migrations still run.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        migrations::run_postgres_migrations(&pool).await?;
        Ok(Self {
            pool,
            statements: Statements::for_dialect(Dialect::Postgres),
        })
    }
}

#[async_trait]
impl ResponseStore for PostgresStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    async fn insert(&self, new: &NewResponse) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(&self.statements.insert)
            .bind(&new.prompt)
            .bind(&new.response)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| XinjieError::Storage(format!("Failed to save response: {}", e)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ResponseRecord>> {
        let row = sqlx::query_as::<_, ResponseRow>(&self.statements.select_by_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| XinjieError::Storage(format!("Failed to load response: {}", e)))?;
        Ok(row.map(ResponseRecord::from))
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<ResponseRecord>> {
        let rows = sqlx::query_as::<_, ResponseRow>(&self.statements.select_page)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| XinjieError::Storage(format!("Page query: {}", e)))?;
        Ok(rows.into_iter().map(ResponseRecord::from).collect())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&self.statements.count)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| XinjieError::Storage(format!("Count query: {}", e)))?;
        Ok(count.max(0) as u64)
    }
}
