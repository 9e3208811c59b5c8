//! Xinjie Service crate - ingestion and history over the storage gateway.
//!
//! [`IngestService`] runs submit -> interpret -> persist. [`HistoryService`]
//! serves single records, pages, SVG export and share links. Both bound
//! every storage call with a deadline.

pub mod history;
pub mod ingest;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use xinjie_core::error::{Result, XinjieError};

pub use history::HistoryService;
pub use ingest::{validate_prompt, IngestService};

/// Run a storage future, turning an expired deadline into a storage error.
pub(crate) async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Storage call timed out");
            Err(XinjieError::Storage(format!(
                "{} timed out after {} ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}
