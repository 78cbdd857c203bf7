// src/models/metadata.rs

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the last sync run that replaced the store's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    pub last_synced_at: DateTime<Utc>,
    /// Records parsed from the source in that run
    pub record_count: usize,
    /// Generation tag the run published
    pub generation: u64,
    /// SHA-256 of the fetched export body, hex encoded
    pub source_digest: String,
}

/// Collection statistics reported by a document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub count: usize,
    /// Tag of the live generation (0 before the first replace)
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Shared record of the last replacing sync run.
///
/// Written by the sync job, read by the aggregation service. Cloning the
/// handle shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    inner: Arc<RwLock<Option<SyncMetadata>>>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<SyncMetadata> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, metadata: SyncMetadata) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(metadata);
    }
}
