//! The storage gateway trait and backend selection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use xinjie_core::config::{expand_home, Backend, StorageConfig};
use xinjie_core::error::{Result, XinjieError};
use xinjie_core::types::{NewResponse, ResponseRecord};

use crate::postgres::PostgresStore;
use crate::sqlite::SqliteStore;

/// Query contract over the `responses` table.
///
/// Implementations must behave identically: ids come from the engine,
/// listings are newest first, and every failure surfaces as
/// [`XinjieError::Storage`].
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Which engine this store talks to.
    fn backend(&self) -> Backend;

    /// Insert one record and return its generated id.
    async fn insert(&self, new: &NewResponse) -> Result<i64>;

    async fn find_by_id(&self, id: i64) -> Result<Option<ResponseRecord>>;

    /// Up to `limit` records starting at `offset`, newest first.
    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<ResponseRecord>>;

    async fn count(&self) -> Result<u64>;
}

/// Open the store selected by `config.backend` and apply migrations.
///
/// This is the only place that branches on the deployment mode.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn ResponseStore>> {
    let timeout = Duration::from_millis(config.timeout_ms);
    match config.backend {
        Backend::Sqlite => {
            let path = expand_home(&config.sqlite_path);
            let store = SqliteStore::open(&path, timeout)?;
            info!(backend = "sqlite", path = %path.display(), "Response store ready");
            Ok(Arc::new(store))
        }
        Backend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| {
                    XinjieError::Config(
                        "storage.database_url (or DATABASE_URL) is required for the postgres backend"
                            .to_string(),
                    )
                })?;
            let store = PostgresStore::connect(url, config.max_connections, timeout).await?;
            info!(
                backend = "postgres",
                max_connections = config.max_connections,
                "Response store ready"
            );
            Ok(Arc::new(store))
        }
    }
}
