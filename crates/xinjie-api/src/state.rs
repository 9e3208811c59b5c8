//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use xinjie_core::config::XinjieConfig;
use xinjie_interpret::Interpreter;
use xinjie_service::{HistoryService, IngestService};
use xinjie_storage::ResponseStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. There is
/// no mutable state; the store owns its own connection resources.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub history: Arc<HistoryService>,
    pub store: Arc<dyn ResponseStore>,
    /// Base for share links, without a trailing slash.
    pub public_base_url: Arc<str>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: &XinjieConfig,
        store: Arc<dyn ResponseStore>,
        interpreter: Arc<dyn Interpreter>,
    ) -> Self {
        let storage_timeout = Duration::from_millis(config.storage.timeout_ms);
        Self {
            ingest: Arc::new(IngestService::new(
                interpreter,
                Arc::clone(&store),
                config.ingest.clone(),
                storage_timeout,
            )),
            history: Arc::new(HistoryService::new(Arc::clone(&store), storage_timeout)),
            store,
            public_base_url: config.general.public_base_url.trim_end_matches('/').into(),
            start_time: Instant::now(),
        }
    }
}
