use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, XinjieError};

/// Top-level configuration for the Xinjie service.
///
/// Loaded from `~/.xinjie/config.toml` by default. Every section is
/// optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XinjieConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl XinjieConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: XinjieConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Externally visible base URL, used to build share links.
    pub public_base_url: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Which relational engine backs the response table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Embedded, file-based SQLite.
    #[default]
    #[serde(alias = "embedded")]
    Sqlite,
    /// Hosted PostgreSQL reached through a connection pool.
    #[serde(alias = "hosted")]
    Postgres,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = XinjieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "embedded" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" | "hosted" => Ok(Backend::Postgres),
            other => Err(XinjieError::Config(format!(
                "Unknown storage backend '{}'. Expected sqlite or postgres",
                other
            ))),
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// SQLite database file, used when `backend = "sqlite"`.
    pub sqlite_path: String,
    /// PostgreSQL connection string. Normally supplied through
    /// `DATABASE_URL` rather than written to the config file.
    pub database_url: Option<String>,
    /// Maximum pooled connections for the hosted backend.
    pub max_connections: u32,
    /// Upper bound for a single storage call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            sqlite_path: "~/.xinjie/data/xinjie.db".to_string(),
            database_url: None,
            max_connections: 5,
            timeout_ms: 5_000,
        }
    }
}

/// Interpretation API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
    /// Optional session cookie forwarded verbatim.
    pub cookie: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://hanyuxinjie.com/api/hyxj".to_string(),
            timeout_ms: 30_000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
                .to_string(),
            origin: "https://hanyuxinjie.com".to_string(),
            referer: "https://hanyuxinjie.com/".to_string(),
            cookie: None,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Prompt acceptance policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum prompt length in characters. `None` disables the cap.
    pub max_prompt_chars: Option<usize>,
}
