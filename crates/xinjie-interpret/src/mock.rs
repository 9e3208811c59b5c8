//! Offline interpreter for tests and local runs without network access.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use xinjie_core::error::{Result, XinjieError};

use crate::Interpreter;

/// Deterministic [`Interpreter`] that renders the word into a tiny SVG card,
/// or fails every call when built with [`MockInterpreter::failing`].
#[derive(Debug, Default)]
pub struct MockInterpreter {
    fail: bool,
    calls: AtomicU64,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interpreter whose upstream is always down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `interpret` calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// The SVG this mock returns for `word`.
    pub fn render(word: &str) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"400\" height=\"600\">\
             <text x=\"200\" y=\"300\" text-anchor=\"middle\">{}</text></svg>",
            escape_xml(word)
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[async_trait]
impl Interpreter for MockInterpreter {
    async fn interpret(&self, word: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(XinjieError::Upstream("mock upstream unavailable".to_string()));
        }
        Ok(Self::render(word))
    }
}
