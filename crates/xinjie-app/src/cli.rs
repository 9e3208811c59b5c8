//! CLI argument definitions for the Xinjie server.
//!
//! Uses `clap` with derive macros for argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use xinjie_core::config::{Backend, XinjieConfig};
use xinjie_core::error::Result;

/// Xinjie - turns Chinese words into illustrated "new interpretations" and
/// keeps a browsable history of them.
#[derive(Parser, Debug, Default)]
#[command(name = "xinjie", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind the API server to.
    #[arg(short = 'b', long = "bind")]
    pub bind: Option<String>,

    /// Storage backend (sqlite or postgres).
    #[arg(long = "backend")]
    pub backend: Option<Backend>,

    /// SQLite database file for the embedded backend.
    #[arg(long = "sqlite-path")]
    pub sqlite_path: Option<PathBuf>,

    /// PostgreSQL connection string for the hosted backend.
    #[arg(long = "database-url")]
    pub database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Serve generated placeholder SVGs instead of calling the upstream API.
    #[arg(long = "mock-upstream")]
    pub mock_upstream: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > XINJIE_CONFIG env var > ~/.xinjie/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env_var("XINJIE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply CLI flags and environment overrides on top of a loaded config.
    pub fn apply(&self, config: &mut XinjieConfig) -> Result<()> {
        self.apply_with(config, env_var)
    }

    fn apply_with<F>(&self, config: &mut XinjieConfig, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Port: --port > XINJIE_PORT > config.
        if let Some(port) = self.port {
            config.general.port = port;
        } else if let Some(port) = env("XINJIE_PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.general.port = port;
        }

        if let Some(ref bind) = self.bind {
            config.general.bind = bind.clone();
        }

        // Backend: --backend > XINJIE_BACKEND > config.
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        } else if let Some(raw) = env("XINJIE_BACKEND") {
            config.storage.backend = raw.parse()?;
        }

        if let Some(ref path) = self.sqlite_path {
            config.storage.sqlite_path = path.to_string_lossy().to_string();
        }

        // Connection string: --database-url > DATABASE_URL > config.
        if let Some(ref url) = self.database_url {
            config.storage.database_url = Some(url.clone());
        } else if let Some(url) = env("DATABASE_URL") {
            config.storage.database_url = Some(url);
        }

        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".xinjie").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".xinjie").join("config.toml");
    }
    PathBuf::from("config.toml")
}
