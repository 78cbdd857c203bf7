//! Storage abstractions for document persistence.
//!
//! Implements the generation-switch pattern: every replace-all writes a
//! complete new generation off to the side, then swaps a single pointer.
//! Readers hold an `Arc` to whichever generation was live when they started,
//! so they observe the old set or the new set, never a mix or an empty gap.
//!
//! ## Backends
//!
//! - `MemoryStore`: process-local, the pointer is an `Arc` behind a lock
//! - `LocalStore`: the same, persisted as JSON generation files
//!
//! ```text
//! {root}/
//! ├── current.json                  # Pointer to the live generation
//! └── generations/
//!     └── 0000000000000003.json     # One complete generation
//! ```

pub mod generation;
pub mod local;
pub mod memory;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::utils::fold_key;
use crate::models::{
    CollectionStats, DocumentId, ID_FIELD, RawDocument, StorageBackend, StorageConfig,
};

// Re-export for convenience
pub use generation::Generation;
pub use local::LocalStore;
pub use memory::MemoryStore;

/// Equality match of one field against a set of accepted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: String,
    pub values: Vec<String>,
    /// Compare ignoring case and whitespace runs
    pub folded: bool,
}

impl FieldMatch {
    /// Exact match on the trimmed field text.
    pub fn new(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values,
            folded: false,
        }
    }

    /// Match ignoring case and whitespace runs (`cse` finds `CSE`).
    pub fn folded(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values: values.iter().map(|v| fold_key(v)).collect(),
            folded: true,
        }
    }

    fn matches(&self, document: &RawDocument) -> bool {
        let Some(value) = document.text(&self.field) else {
            return false;
        };
        let value = if self.folded { fold_key(&value) } else { value };
        self.values.iter().any(|v| *v == value)
    }
}

/// Document filter for `find_all`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    /// Every document
    #[default]
    All,
    /// Documents matching at least one clause (logical OR)
    AnyOf(Vec<FieldMatch>),
}

impl Filter {
    pub fn matches(&self, document: &RawDocument) -> bool {
        match self {
            Filter::All => true,
            Filter::AnyOf(clauses) => clauses.iter().any(|c| c.matches(document)),
        }
    }
}

/// Metadata about a replace-all operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSummary {
    /// Documents in the new generation
    pub count: usize,
    /// Tag of the new generation
    pub generation: u64,
    /// Timestamp of the switch
    pub replaced_at: DateTime<Utc>,
}

/// Trait for document store backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of the live generation matching `filter`, in store order.
    async fn find_all(&self, filter: &Filter) -> Result<Vec<RawDocument>>;

    /// Atomically replace the entire collection.
    ///
    /// Identifiers are assigned to every document; any `_id` already present
    /// is overwritten.
    async fn replace_all(&self, documents: Vec<RawDocument>) -> Result<ReplaceSummary>;

    /// Insert a single document, returning its new identifier.
    async fn insert_one(&self, document: RawDocument) -> Result<DocumentId>;

    /// Set the fields of `patch` on the document. Returns the modified count.
    async fn update_one(&self, id: &DocumentId, patch: RawDocument) -> Result<u64>;

    /// Remove the document. Returns the deleted count.
    async fn delete_one(&self, id: &DocumentId) -> Result<u64>;

    /// Collection statistics.
    async fn stats(&self) -> Result<CollectionStats>;

    /// Distinct non-empty values of `field`, sorted.
    async fn distinct_values(&self, field: &str) -> Result<Vec<String>>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Open the configured backend.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.backend {
        StorageBackend::Memory => {
            log::info!("Using in-memory store for '{}'", config.collection);
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Local => {
            let root = std::path::Path::new(&config.root_dir).join(&config.collection);
            log::info!("Using local store at {}", root.display());
            Ok(Arc::new(LocalStore::open(root).await?))
        }
    }
}

/// Reject mutation payloads that try to set the store identifier.
pub(crate) fn check_payload(document: &RawDocument) -> Result<()> {
    if document.contains(ID_FIELD) {
        return Err(AppError::validation(format!(
            "'{ID_FIELD}' is assigned by the store and cannot be set"
        )));
    }
    Ok(())
}

/// Monotonic identifier source for one store.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Start handing out sequence numbers at `sequence`.
    pub fn starting_at(sequence: u64) -> Self {
        Self {
            next: AtomicU64::new(sequence),
        }
    }

    pub fn next_id(&self) -> DocumentId {
        let sequence = self.next.fetch_add(1, Ordering::Relaxed);
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        DocumentId::from_parts(seconds, sequence)
    }
}
