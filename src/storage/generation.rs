// src/storage/generation.rs

//! One complete, immutable snapshot of the collection.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CollectionStats, DocumentId, ID_FIELD, RawDocument};
use crate::storage::{Filter, IdGenerator};

/// A complete snapshot of the collection.
///
/// Generations are never mutated in place; single-document writes produce a
/// copy with the same tag, replace-all produces a copy with a new tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub tag: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub documents: Vec<RawDocument>,
}

impl Generation {
    /// The generation a fresh store starts with.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            tag: 0,
            created_at: now,
            updated_at: now,
            documents: Vec::new(),
        }
    }

    /// Build generation `tag` from `documents`, assigning fresh identifiers.
    pub fn build(tag: u64, documents: Vec<RawDocument>, ids: &IdGenerator) -> Self {
        let now = Utc::now();
        let documents = documents
            .into_iter()
            .map(|mut doc| {
                doc.set(ID_FIELD, ids.next_id().as_str());
                doc
            })
            .collect();
        Self {
            tag,
            created_at: now,
            updated_at: now,
            documents,
        }
    }

    pub fn find(&self, filter: &Filter) -> Vec<RawDocument> {
        self.documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect()
    }

    pub fn distinct(&self, field: &str) -> Vec<String> {
        self.documents
            .iter()
            .filter_map(|doc| doc.text(field))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            count: self.documents.len(),
            generation: self.tag,
            updated_at: (self.tag > 0 || !self.documents.is_empty()).then_some(self.updated_at),
        }
    }

    /// Highest identifier sequence in use, if any.
    pub fn max_sequence(&self) -> Option<u64> {
        self.documents
            .iter()
            .filter_map(|doc| doc.id())
            .filter_map(|id| DocumentId::parse(id).ok())
            .map(|id| id.sequence())
            .max()
    }

    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.id() == Some(id.as_str()))
    }

    fn touched(&self, documents: Vec<RawDocument>) -> Self {
        Self {
            tag: self.tag,
            created_at: self.created_at,
            updated_at: Utc::now(),
            documents,
        }
    }

    /// Copy with `document` appended.
    pub fn with_inserted(&self, document: RawDocument) -> Self {
        let mut documents = self.documents.clone();
        documents.push(document);
        self.touched(documents)
    }

    /// Copy with `patch` applied to document `id`.
    ///
    /// `None` when the document is missing or the patch changes nothing.
    pub fn with_updated(&self, id: &DocumentId, patch: &RawDocument) -> Option<Self> {
        let index = self.position(id)?;
        let target = &self.documents[index];
        let changed = patch
            .fields()
            .iter()
            .any(|(key, value)| target.get(key) != Some(value));
        if !changed {
            return None;
        }

        let mut documents = self.documents.clone();
        for (key, value) in patch.fields() {
            documents[index].set(key.clone(), value.clone());
        }
        Some(self.touched(documents))
    }

    /// Copy without document `id`; `None` when it is missing.
    pub fn with_deleted(&self, id: &DocumentId) -> Option<Self> {
        let index = self.position(id)?;
        let mut documents = self.documents.clone();
        documents.remove(index);
        Some(self.touched(documents))
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::empty()
    }
}
