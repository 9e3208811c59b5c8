//! Read side: single records, pages, SVG export and share links.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use xinjie_core::error::{Result, XinjieError};
use xinjie_core::types::{page_offset, total_pages, ResponsePage, ResponseRecord, ShareLinks, PAGE_SIZE};
use xinjie_storage::ResponseStore;

use crate::with_deadline;

const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet";

/// Paginated history over the response store.
pub struct HistoryService {
    store: Arc<dyn ResponseStore>,
    storage_timeout: Duration,
}

impl HistoryService {
    pub fn new(store: Arc<dyn ResponseStore>, storage_timeout: Duration) -> Self {
        Self {
            store,
            storage_timeout,
        }
    }

    /// Fetch one record, or `NotFound`.
    pub async fn get_by_id(&self, id: i64) -> Result<ResponseRecord> {
        with_deadline(self.storage_timeout, "load response", self.store.find_by_id(id))
            .await?
            .ok_or_else(|| XinjieError::NotFound(format!("Response {} not found", id)))
    }

    /// One page of [`PAGE_SIZE`] records, newest first.
    ///
    /// Pages past the end come back empty with `page` echoed.
    pub async fn list_page(&self, page: u64) -> Result<ResponsePage> {
        if page == 0 {
            return Err(XinjieError::Validation(
                "Parameter 'page' must be 1 or greater".to_string(),
            ));
        }

        let offset = page_offset(page, PAGE_SIZE);
        let records = with_deadline(
            self.storage_timeout,
            "list responses",
            self.store.list(PAGE_SIZE, offset),
        )
        .await?;
        let total_count = self.total_count().await?;

        debug!(page, offset, returned = records.len(), total_count, "History page loaded");

        Ok(ResponsePage {
            records,
            current_page: page,
            total_pages: total_pages(total_count, PAGE_SIZE),
            total_count,
        })
    }

    /// Number of stored records.
    pub async fn total_count(&self) -> Result<u64> {
        with_deadline(self.storage_timeout, "count responses", self.store.count()).await
    }

    /// The stored image payload of a record.
    pub async fn svg(&self, id: i64) -> Result<String> {
        Ok(self.get_by_id(id).await?.response)
    }

    /// Permalink, SVG link and a pre-filled tweet for a record.
    pub async fn share(&self, id: i64, base_url: &str) -> Result<ShareLinks> {
        let record = self.get_by_id(id).await?;
        build_share_links(&record, base_url)
    }
}

fn build_share_links(record: &ResponseRecord, base_url: &str) -> Result<ShareLinks> {
    let base = base_url.trim_end_matches('/');
    let url = format!("{}/responses/{}", base, record.id);
    let svg_url = format!("{}/svg", url);
    let text = format!("汉语新解：{}", record.prompt);

    let twitter_url = Url::parse_with_params(TWITTER_INTENT, &[("text", text.as_str()), ("url", url.as_str())])
        .map_err(|e| XinjieError::Config(format!("Invalid share URL: {}", e)))?
        .to_string();

    Ok(ShareLinks {
        url,
        svg_url,
        text,
        twitter_url,
    })
}
