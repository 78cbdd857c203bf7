//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the sheet export is fetched from
    #[serde(default)]
    pub source: SourceConfig,

    /// Background sync schedule
    #[serde(default)]
    pub sync: SyncConfig,

    /// Document store backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.sync.enabled && !self.source.is_configured() {
            return Err(AppError::validation(
                "sync is enabled but neither source.sheet_id nor source.csv_url is set",
            ));
        }
        if self.sync.interval_secs == 0 {
            return Err(AppError::validation("sync.interval_secs must be > 0"));
        }
        if let Some(percent) = self.sync.max_drop_percent {
            if percent > 100 {
                return Err(AppError::validation(
                    "sync.max_drop_percent must be between 0 and 100",
                ));
            }
        }
        if self.storage.backend == StorageBackend::Local && self.storage.root_dir.trim().is_empty()
        {
            return Err(AppError::validation("storage.root_dir is empty"));
        }
        if self.storage.collection.trim().is_empty() {
            return Err(AppError::validation("storage.collection is empty"));
        }
        if self.server.port == 0 {
            return Err(AppError::validation("server.port must be > 0"));
        }
        for origin in &self.server.cors_origins {
            url::Url::parse(origin).map_err(|e| {
                AppError::validation(format!("server.cors_origins: '{origin}' ({e})"))
            })?;
        }
        Ok(())
    }
}

/// Sheet export location and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Google Sheets document id, or a full sheet URL
    #[serde(default)]
    pub sheet_id: Option<String>,

    /// Explicit CSV export URL (takes precedence over `sheet_id`)
    #[serde(default)]
    pub csv_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl SourceConfig {
    pub fn is_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.csv_url) || set(&self.sheet_id)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sheet_id: None,
            csv_url: None,
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Background sync schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Run the periodic sync task
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Seconds between sync runs
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Sync once before serving requests
    #[serde(default = "defaults::enabled")]
    pub run_on_startup: bool,

    /// Refuse a sync whose record count drops by more than this percentage.
    /// Unset disables the check; empty exports are always refused.
    #[serde(default)]
    pub max_drop_percent: Option<u8>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            interval_secs: defaults::interval(),
            run_on_startup: defaults::enabled(),
            max_drop_percent: None,
        }
    }
}

/// Document store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit
    Memory,
    /// JSON generation files under `root_dir`
    Local,
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::backend")]
    pub backend: StorageBackend,

    /// Root directory for the local backend
    #[serde(default = "defaults::root_dir")]
    pub root_dir: String,

    /// Collection name, also the local store subdirectory
    #[serde(default = "defaults::collection")]
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: defaults::backend(),
            root_dir: defaults::root_dir(),
            collection: defaults::collection(),
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Browser origins allowed to call the API
    #[serde(default = "defaults::cors_origins")]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            cors_origins: defaults::cors_origins(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    use super::StorageBackend;

    // Source defaults
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sheetsync/0.1)".into()
    }

    // Sync defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn interval() -> u64 {
        300
    }

    // Storage defaults
    pub fn backend() -> StorageBackend {
        StorageBackend::Local
    }
    pub fn root_dir() -> String {
        "storage".into()
    }
    pub fn collection() -> String {
        "gsheets".into()
    }

    // Server defaults
    pub fn host() -> String {
        "127.0.0.1".into()
    }
    pub fn port() -> u16 {
        5000
    }
    pub fn cors_origins() -> Vec<String> {
        vec![
            "http://localhost:5173".into(),
            "http://localhost:3000".into(),
        ]
    }

    pub fn level() -> String {
        "info".into()
    }
}
