//! In-memory document store.
//!
//! The live generation sits behind an `Arc` pointer. Readers clone the
//! pointer and work on that snapshot without holding any lock; writers build
//! a new generation and swap the pointer. An old generation is freed when the
//! last reader holding it finishes.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::models::{CollectionStats, DocumentId, ID_FIELD, RawDocument};
use crate::storage::{
    DocumentStore, Filter, Generation, IdGenerator, ReplaceSummary, check_payload,
};

/// Process-local document store.
pub struct MemoryStore {
    current: RwLock<Arc<Generation>>,
    writer: Mutex<()>,
    ids: IdGenerator,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_generation(Generation::empty())
    }

    /// Create a store whose live generation is `generation`.
    pub fn from_generation(generation: Generation) -> Self {
        let next_sequence = generation.max_sequence().map_or(0, |s| s + 1);
        Self {
            current: RwLock::new(Arc::new(generation)),
            writer: Mutex::new(()),
            ids: IdGenerator::starting_at(next_sequence),
        }
    }

    /// The live generation.
    pub fn snapshot(&self) -> Arc<Generation> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Build the next generation from `documents` without publishing it.
    pub fn stage(&self, documents: Vec<RawDocument>) -> Generation {
        let tag = self.snapshot().tag + 1;
        Generation::build(tag, documents, &self.ids)
    }

    /// Make `generation` live, returning the one it replaced.
    pub fn publish(&self, generation: Generation) -> Arc<Generation> {
        let next = Arc::new(generation);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Serialize writers. Held across stage and publish.
    pub async fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    pub(crate) fn next_id(&self) -> DocumentId {
        self.ids.next_id()
    }

    pub(crate) fn summary(generation: &Generation) -> ReplaceSummary {
        ReplaceSummary {
            count: generation.documents.len(),
            generation: generation.tag,
            replaced_at: generation.created_at,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, filter: &Filter) -> Result<Vec<RawDocument>> {
        Ok(self.snapshot().find(filter))
    }

    async fn replace_all(&self, documents: Vec<RawDocument>) -> Result<ReplaceSummary> {
        let _writer = self.lock_writer().await;
        let staged = self.stage(documents);
        let summary = Self::summary(&staged);
        let previous = self.publish(staged);
        log::debug!(
            "Generation {} replaced by {} ({} documents)",
            previous.tag,
            summary.generation,
            summary.count
        );
        Ok(summary)
    }

    async fn insert_one(&self, mut document: RawDocument) -> Result<DocumentId> {
        check_payload(&document)?;
        let _writer = self.lock_writer().await;
        let id = self.next_id();
        document.set(ID_FIELD, id.as_str());
        let next = self.snapshot().with_inserted(document);
        self.publish(next);
        Ok(id)
    }

    async fn update_one(&self, id: &DocumentId, patch: RawDocument) -> Result<u64> {
        check_payload(&patch)?;
        let _writer = self.lock_writer().await;
        match self.snapshot().with_updated(id, &patch) {
            Some(next) => {
                self.publish(next);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: &DocumentId) -> Result<u64> {
        let _writer = self.lock_writer().await;
        match self.snapshot().with_deleted(id) {
            Some(next) => {
                self.publish(next);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn stats(&self) -> Result<CollectionStats> {
        Ok(self.snapshot().stats())
    }

    async fn distinct_values(&self, field: &str) -> Result<Vec<String>> {
        Ok(self.snapshot().distinct(field))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
