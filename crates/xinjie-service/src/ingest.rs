//! Prompt submission: validate, interpret, persist.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use xinjie_core::config::IngestConfig;
use xinjie_core::error::{Result, XinjieError};
use xinjie_core::types::{NewResponse, Submission};
use xinjie_interpret::Interpreter;
use xinjie_storage::ResponseStore;

use crate::with_deadline;

/// Check a raw prompt against the acceptance policy and return it trimmed.
///
/// Length is counted in characters, so a ten-character cap admits ten
/// CJK characters.
pub fn validate_prompt<'a>(raw: &'a str, policy: &IngestConfig) -> Result<&'a str> {
    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(XinjieError::Validation(
            "Field \"prompt\" must be a non-empty string".to_string(),
        ));
    }

    if let Some(max) = policy.max_prompt_chars {
        let len = prompt.chars().count();
        if len > max {
            return Err(XinjieError::Validation(format!(
                "Field \"prompt\" must be at most {} characters (got {})",
                max, len
            )));
        }
    }

    Ok(prompt)
}

/// Orchestrates one submission.
///
/// Nothing is written unless the upstream call succeeds; a storage
/// failure after that is reported and no record should be assumed.
pub struct IngestService {
    interpreter: Arc<dyn Interpreter>,
    store: Arc<dyn ResponseStore>,
    policy: IngestConfig,
    storage_timeout: Duration,
}

impl IngestService {
    pub fn new(
        interpreter: Arc<dyn Interpreter>,
        store: Arc<dyn ResponseStore>,
        policy: IngestConfig,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            interpreter,
            store,
            policy,
            storage_timeout,
        }
    }

    pub async fn submit(&self, raw_prompt: &str) -> Result<Submission> {
        let prompt = validate_prompt(raw_prompt, &self.policy)?;

        let result = self.interpreter.interpret(prompt).await.inspect_err(|e| {
            warn!(error = %e, "Interpretation failed; nothing stored");
        })?;

        let id = with_deadline(
            self.storage_timeout,
            "insert response",
            self.store.insert(&NewResponse::new(prompt, result.clone())),
        )
        .await
        .inspect_err(|e| {
            warn!(error = %e, "Failed to persist interpretation");
        })?;

        info!(id, backend = %self.store.backend(), "Response stored");
        Ok(Submission { id, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use xinjie_core::config::Backend;
    use xinjie_core::types::ResponseRecord;
    use xinjie_interpret::MockInterpreter;
    use xinjie_storage::SqliteStore;

    fn service_with(interpreter: Arc<dyn Interpreter>, store: Arc<dyn ResponseStore>) -> IngestService {
        IngestService::new(
            interpreter,
            store,
            IngestConfig::default(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_validate_trims_and_rejects_blank() {
        let policy = IngestConfig::default();
        assert_eq!(validate_prompt("  日  ", &policy).unwrap(), "日");
        assert!(matches!(
            validate_prompt("", &policy),
            Err(XinjieError::Validation(_))
        ));
        assert!(matches!(
            validate_prompt(" \t\n ", &policy),
            Err(XinjieError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_length_cap_counts_chars() {
        let policy = IngestConfig {
            max_prompt_chars: Some(10),
        };
        // Ten CJK characters are thirty bytes but within the cap.
        assert!(validate_prompt("一二三四五六七八九十", &policy).is_ok());
        let err = validate_prompt("一二三四五六七八九十百", &policy).unwrap_err();
        assert!(err.to_string().contains("at most 10"));
    }

    #[tokio::test]
    async fn test_submit_stores_result() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let service = service_with(Arc::new(MockInterpreter::new()), store.clone());

        let submission = service.submit(" 山 ").await.unwrap();
        assert_eq!(submission.result, MockInterpreter::render("山"));

        let record = store.find_by_id(submission.id).await.unwrap().unwrap();
        assert_eq!(record.prompt, "山");
        assert_eq!(record.response, submission.result);
    }

    #[tokio::test]
    async fn test_stored_prompt_is_trimmed_but_otherwise_verbatim() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let service = service_with(Arc::new(MockInterpreter::new()), store.clone());

        for (sent, stored) in [
            ("\t 日 月 \n", "日 月"),
            ("山", "山"),
            ("  <b>&水</b>  ", "<b>&水</b>"),
        ] {
            let submission = service.submit(sent).await.unwrap();
            let record = store.find_by_id(submission.id).await.unwrap().unwrap();
            assert_eq!(record.prompt, stored);
            assert_eq!(submission.result, MockInterpreter::render(stored));
        }
    }

    #[tokio::test]
    async fn test_validation_failure_skips_upstream() {
        let mock = Arc::new(MockInterpreter::new());
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let service = service_with(mock.clone(), store.clone());

        let err = service.submit("   ").await.unwrap_err();
        assert!(matches!(err, XinjieError::Validation(_)));
        assert_eq!(mock.calls(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_writes_nothing() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let service = service_with(Arc::new(MockInterpreter::failing()), store.clone());

        let before = store.count().await.unwrap();
        let err = service.submit("日").await.unwrap_err();
        assert!(matches!(err, XinjieError::Upstream(_)));
        assert_eq!(store.count().await.unwrap(), before);
    }

    /// Store whose writes never finish.
    struct StalledStore;

    #[async_trait]
    impl ResponseStore for StalledStore {
        fn backend(&self) -> Backend {
            Backend::Sqlite
        }

        async fn insert(&self, _new: &NewResponse) -> Result<i64> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1)
        }

        async fn find_by_id(&self, _id: i64) -> Result<Option<ResponseRecord>> {
            Ok(None)
        }

        async fn list(&self, _limit: u64, _offset: u64) -> Result<Vec<ResponseRecord>> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_storage_times_out() {
        let service = IngestService::new(
            Arc::new(MockInterpreter::new()),
            Arc::new(StalledStore),
            IngestConfig::default(),
            Duration::from_millis(250),
        );

        let err = service.submit("日").await.unwrap_err();
        assert!(matches!(err, XinjieError::Storage(ref msg) if msg.contains("timed out")));
    }
}
