//! Domain types shared by storage, services and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of records per history page.
pub const PAGE_SIZE: u64 = 10;

/// A stored prompt together with the illustration the upstream API
/// returned for it. Created once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub prompt: String,
    /// Serialized image, normally SVG markup.
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. The engine assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub prompt: String,
    pub response: String,
}

impl NewResponse {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub result: String,
}

/// One page of history, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePage {
    pub records: Vec<ResponseRecord>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
}

/// Links and text for sharing a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLinks {
    pub url: String,
    pub svg_url: String,
    pub text: String,
    pub twitter_url: String,
}

/// `ceil(total / page_size)`, zero when there is nothing to page through.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Row offset of the first record on `page` (1-based).
pub fn page_offset(page: u64, page_size: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, PAGE_SIZE), 0);
        assert_eq!(total_pages(1, PAGE_SIZE), 1);
        assert_eq!(total_pages(10, PAGE_SIZE), 1);
        assert_eq!(total_pages(11, PAGE_SIZE), 2);
        assert_eq!(total_pages(15, PAGE_SIZE), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, PAGE_SIZE), 0);
        assert_eq!(page_offset(2, PAGE_SIZE), 10);
        assert_eq!(page_offset(7, 3), 18);
        assert_eq!(page_offset(u64::MAX, PAGE_SIZE), u64::MAX);
    }

    #[test]
    fn test_record_serializes_snake_case_fields() {
        let record = ResponseRecord {
            id: 3,
            prompt: "山".to_string(),
            response: "<svg/>".to_string(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["prompt"], "山");
        assert_eq!(json["response"], "<svg/>");
        assert!(json["created_at"].as_str().unwrap().starts_with("2023-11-14"));
    }
}
