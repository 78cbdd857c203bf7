// src/utils/url.rs

//! Source URL resolution.

use regex::Regex;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d/";

/// Extract a sheet id from either a bare id or a full Google Sheets URL.
pub fn extract_sheet_id(input: &str) -> Option<String> {
    let input = input.trim();
    let from_url = Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").ok()?;
    if let Some(caps) = from_url.captures(input) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    let bare = Regex::new(r"^[A-Za-z0-9_-]+$").ok()?;
    bare.is_match(input).then(|| input.to_string())
}

/// CSV export URL for a sheet id.
pub fn sheet_export_url(sheet_id: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_BASE)?.join(&format!("{sheet_id}/export"))?;
    url.query_pairs_mut().append_pair("format", "csv");
    Ok(url)
}

/// Resolve the URL the sync job fetches from.
///
/// An explicit `csv_url` wins over `sheet_id`.
pub fn source_url(config: &SourceConfig) -> Result<Url> {
    if let Some(raw) = config.csv_url.as_deref().filter(|s| !s.trim().is_empty()) {
        let url = Url::parse(raw.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "source.csv_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        return Ok(url);
    }

    let raw = config
        .sheet_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::config("no source configured (set source.sheet_id or source.csv_url)"))?;
    let sheet_id = extract_sheet_id(raw)
        .ok_or_else(|| AppError::config(format!("'{raw}' is not a valid sheet id")))?;
    sheet_export_url(&sheet_id)
}
