// src/error.rs

//! Unified error handling for the sync service.

use std::fmt;

use thiserror::Error;

/// Result type alias for sheetsync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport failure while fetching the sheet export
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The sheet export answered with a non-success status
    #[error("Fetch error: {url} returned HTTP {status}")]
    SourceStatus { url: String, status: u16 },

    /// Malformed tabular text
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSV reader failure
    #[error("Parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Persistence layer unavailable or operation rejected
    #[error("Store error: {0}")]
    Store(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed mutation payload or identifier
    #[error("Validation error: {0}")]
    Validation(String),

    /// A sync run is already in flight
    #[error("A sync run is already in progress")]
    SyncInProgress,
}

impl AppError {
    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create a store error.
    pub fn store(message: impl fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures reaching or reading the source.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::SourceStatus { .. })
    }

    /// True for malformed source text.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Csv(_))
    }

    /// True for persistence failures.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_) | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(AppError::SourceStatus {
            url: "https://example.com".into(),
            status: 404
        }
        .is_fetch());
        assert!(AppError::parse("unbalanced quote").is_parse());
        assert!(AppError::store("closed").is_store());
        assert!(!AppError::validation("bad id").is_store());
    }

    #[test]
    fn test_display_messages() {
        let err = AppError::SourceStatus {
            url: "https://example.com/export".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "Fetch error: https://example.com/export returned HTTP 503"
        );
        assert_eq!(
            AppError::validation("body must be a JSON object").to_string(),
            "Validation error: body must be a JSON object"
        );
    }
}
