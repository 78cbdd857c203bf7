// src/config.rs

//! Environment overrides.
//!
//! The TOML file is read first (see `Config::load`), then the deployment
//! environment variables are layered on top.

use crate::error::{AppError, Result};
use crate::models::Config;

/// Google Sheets document id, or a full sheet URL.
pub const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
/// Explicit CSV export URL.
pub const ENV_CSV_URL: &str = "SHEET_CSV_URL";
/// HTTP listen port.
pub const ENV_PORT: &str = "PORT";
/// Seconds between background sync runs.
pub const ENV_SYNC_INTERVAL: &str = "SYNC_INTERVAL_SECS";
/// Root directory of the local store.
pub const ENV_STORAGE_DIR: &str = "STORAGE_DIR";

/// Layer the process environment onto `config`.
///
/// A malformed override is an error.
pub fn apply_env(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Layer environment overrides onto `config` using `lookup`.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(sheet_id) = var(ENV_SHEET_ID) {
        config.source.sheet_id = Some(sheet_id);
    }
    if let Some(url) = var(ENV_CSV_URL) {
        config.source.csv_url = Some(url);
    }
    if let Some(port) = var(ENV_PORT) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{ENV_PORT}='{port}' is not a valid port")))?;
    }
    if let Some(interval) = var(ENV_SYNC_INTERVAL) {
        config.sync.interval_secs = interval.trim().parse().map_err(|_| {
            AppError::config(format!(
                "{ENV_SYNC_INTERVAL}='{interval}' is not a number of seconds"
            ))
        })?;
    }
    if let Some(dir) = var(ENV_STORAGE_DIR) {
        config.storage.root_dir = dir;
    }
    Ok(())
}
