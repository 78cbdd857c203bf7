// src/pipeline/sync.rs

//! Sync job: fetch the sheet export, parse it, replace the collection.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Config, RawDocument, SYNCED_AT_FIELD, SyncMetadata, SyncStatus};
use crate::pipeline::fetch::{HttpSheetSource, SheetSource};
use crate::pipeline::guard::{GuardDecision, SyncGuard};
use crate::pipeline::parse::parse_records;
use crate::storage::DocumentStore;
use crate::utils::sha256_hex;

/// What a sync run did with the parsed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncOutcome {
    /// The collection now holds exactly the parsed records
    Replaced,
    /// Export parsed to zero records; nothing changed
    SkippedEmpty,
    /// Record count dropped past the guard threshold; nothing changed
    SkippedDrop,
}

/// Report of one sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Records parsed from the source
    pub record_count: usize,
    pub outcome: SyncOutcome,
    pub synced_at: DateTime<Utc>,
    /// Generation published by the run, if it replaced
    pub generation: Option<u64>,
    /// SHA-256 of the fetched body
    pub digest: String,
}

/// One-way sync from a sheet source into a document store.
pub struct SyncJob {
    source: Arc<dyn SheetSource>,
    store: Arc<dyn DocumentStore>,
    guard: SyncGuard,
    running: Mutex<()>,
    status: SyncStatus,
}

impl SyncJob {
    pub fn new(
        source: Arc<dyn SheetSource>,
        store: Arc<dyn DocumentStore>,
        guard: SyncGuard,
        status: SyncStatus,
    ) -> Self {
        Self {
            source,
            store,
            guard,
            running: Mutex::new(()),
            status,
        }
    }

    /// Build a job that fetches the configured export over HTTP.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        status: SyncStatus,
    ) -> Result<Self> {
        let source = HttpSheetSource::from_config(&config.source)?;
        Ok(Self::new(
            Arc::new(source),
            store,
            SyncGuard::with_max_drop(config.sync.max_drop_percent),
            status,
        ))
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn source_location(&self) -> String {
        self.source.location()
    }

    /// Run one sync.
    ///
    /// Fails with `SyncInProgress` if another run holds the job. Any failure
    /// leaves the store and the sync status as they were.
    pub async fn run(&self) -> Result<SyncReport> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| AppError::SyncInProgress)?;

        let started = Instant::now();
        log::info!("Sync starting from {}", self.source.location());

        let body = self.source.fetch().await?;
        let digest = sha256_hex(body.as_bytes());
        log::info!(
            "Fetched {} bytes (sha256 {})",
            body.len(),
            &digest[..12.min(digest.len())]
        );

        let rows = parse_records(&body)?;
        let record_count = rows.len();
        let previous = self.store.stats().await?.count;
        let synced_at = Utc::now();

        let outcome = match self.guard.evaluate(record_count, previous) {
            decision if decision.allows_replace() => SyncOutcome::Replaced,
            GuardDecision::Dropped { .. } => SyncOutcome::SkippedDrop,
            _ => SyncOutcome::SkippedEmpty,
        };

        if outcome != SyncOutcome::Replaced {
            log::info!(
                "Sync finished without changes in {:?} ({} records parsed)",
                started.elapsed(),
                record_count
            );
            return Ok(SyncReport {
                record_count,
                outcome,
                synced_at,
                generation: None,
                digest,
            });
        }

        let stamp = synced_at.to_rfc3339();
        let documents: Vec<RawDocument> = rows
            .into_iter()
            .map(|row| {
                let mut document: RawDocument = row.into_iter().collect();
                document.set(SYNCED_AT_FIELD, stamp.as_str());
                document
            })
            .collect();

        let summary = self.store.replace_all(documents).await?;

        self.status.set(SyncMetadata {
            last_synced_at: synced_at,
            record_count,
            generation: summary.generation,
            source_digest: digest.clone(),
        });

        log::info!(
            "Sync complete: {} records, generation {}, {:?}",
            record_count,
            summary.generation,
            started.elapsed()
        );

        Ok(SyncReport {
            record_count,
            outcome,
            synced_at,
            generation: Some(summary.generation),
            digest,
        })
    }
}
