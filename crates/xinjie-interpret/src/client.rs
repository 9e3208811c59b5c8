//! reqwest-backed client for the interpretation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use xinjie_core::config::UpstreamConfig;
use xinjie_core::error::{Result, XinjieError};

use crate::Interpreter;

#[derive(Serialize)]
struct InterpretRequest<'a> {
    word: &'a str,
}

#[derive(Deserialize)]
struct InterpretReply {
    data: Option<ReplyData>,
}

#[derive(Deserialize)]
struct ReplyData {
    image: Option<serde_json::Value>,
}

/// Calls the upstream endpoint with browser-like headers.
#[derive(Debug, Clone)]
pub struct HttpInterpreter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpInterpreter {
    /// Build a client from config. Fails only on header values that are
    /// not valid HTTP (for example a cookie containing a newline).
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let headers = default_headers(config)?;
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| XinjieError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn default_headers(config: &UpstreamConfig) -> Result<HeaderMap> {
    let value = |name: &str, raw: &str| {
        HeaderValue::from_str(raw)
            .map_err(|e| XinjieError::Config(format!("Invalid {} header value: {}", name, e)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(USER_AGENT, value("user-agent", &config.user_agent)?);
    headers.insert(ORIGIN, value("origin", &config.origin)?);
    headers.insert(REFERER, value("referer", &config.referer)?);
    if let Some(cookie) = config.cookie.as_deref().filter(|c| !c.is_empty()) {
        let mut cookie = value("cookie", cookie)?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
    }
    Ok(headers)
}

/// Pull `data.image` out of a decoded reply. Anything but a string is
/// treated as missing.
fn extract_image(reply: InterpretReply) -> Option<String> {
    match reply.data?.image? {
        serde_json::Value::String(image) => Some(image),
        _ => None,
    }
}

#[async_trait]
impl Interpreter for HttpInterpreter {
    async fn interpret(&self, word: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&InterpretRequest { word })
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                warn!(endpoint = %self.endpoint, error = %e, "Upstream request {}", kind);
                XinjieError::Upstream(format!("Upstream request {}: {}", kind, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = %status, "Upstream returned an error status");
            return Err(XinjieError::Upstream(format!(
                "Upstream returned HTTP {}",
                status
            )));
        }

        let reply: InterpretReply = response.json().await.map_err(|e| {
            warn!(error = %e, "Upstream reply was not valid JSON");
            XinjieError::Upstream(format!("Malformed upstream reply: {}", e))
        })?;

        let image = extract_image(reply).ok_or_else(|| {
            warn!("Upstream reply had no data.image field");
            XinjieError::Upstream("Upstream reply is missing data.image".to_string())
        })?;

        debug!(word_len = word.chars().count(), image_len = image.len(), "Interpretation received");
        Ok(image)
    }
}
