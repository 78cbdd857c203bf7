// src/pipeline/fetch.rs

//! Sheet export sources.

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http::create_async_client;
use crate::utils::url::source_url;

/// Something that yields the raw delimited text of the sheet.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch the full export body.
    async fn fetch(&self) -> Result<String>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Fetches the CSV export over HTTP.
pub struct HttpSheetSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpSheetSource {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Build a source from configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Ok(Self::new(client, source_url(config)?))
    }
}

#[async_trait]
impl SheetSource for HttpSheetSource {
    async fn fetch(&self) -> Result<String> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SourceStatus {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    fn location(&self) -> String {
        self.url.to_string()
    }
}

/// A fixed body, for one-off imports and tests.
#[derive(Debug, Clone)]
pub struct StaticSheetSource {
    body: String,
}

impl StaticSheetSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl SheetSource for StaticSheetSource {
    async fn fetch(&self) -> Result<String> {
        Ok(self.body.clone())
    }

    fn location(&self) -> String {
        "static".to_string()
    }
}

/// Reads a CSV file from disk.
#[derive(Debug, Clone)]
pub struct FileSheetSource {
    path: std::path::PathBuf,
}

impl FileSheetSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SheetSource for FileSheetSource {
    async fn fetch(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
