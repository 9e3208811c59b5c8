//! Xinjie Interpret crate - client for the upstream interpretation API.
//!
//! The upstream service turns a word into an SVG illustration. It filters
//! requests by browser headers, so the HTTP details live here behind the
//! [`Interpreter`] trait and can be swapped for [`MockInterpreter`].

pub mod client;
pub mod mock;

use async_trait::async_trait;

use xinjie_core::error::Result;

pub use client::HttpInterpreter;
pub use mock::MockInterpreter;

/// Turns a word or short phrase into an image payload.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Return the image payload for `word`, verbatim.
    ///
    /// Any failure is reported as `XinjieError::Upstream`.
    async fn interpret(&self, word: &str) -> Result<String>;
}
