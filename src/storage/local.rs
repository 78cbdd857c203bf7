//! Local filesystem document store.
//!
//! Serves reads from an in-memory generation pointer and persists every
//! generation as a JSON file, so a restart picks up the last published set.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── current.json                  # Pointer: live tag, file, count
//! └── generations/
//!     └── {tag:016x}.json           # Complete generation
//! ```
//!
//! ## Switch order
//!
//! 1. Write the new generation file (temp file, then rename)
//! 2. Rename the new pointer over `current.json`
//! 3. Swap the in-memory pointer
//! 4. Remove generation files other than the live one
//!
//! A crash before step 2 leaves the old pointer intact; the orphaned file is
//! removed by the next switch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CollectionStats, DocumentId, ID_FIELD, RawDocument};
use crate::storage::{
    DocumentStore, Filter, Generation, MemoryStore, ReplaceSummary, check_payload,
};

const POINTER_KEY: &str = "current.json";
const GENERATIONS_DIR: &str = "generations";

/// Contents of `current.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPointer {
    /// Live generation tag
    pub generation: u64,
    /// Generation file, relative to the root
    pub file: String,
    /// Document count of the live generation
    pub count: usize,
    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,
}

/// Local filesystem storage backend.
pub struct LocalStore {
    root_dir: PathBuf,
    memory: MemoryStore,
}

impl LocalStore {
    /// Open (or initialize) a store rooted at the given directory.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        tokio::fs::create_dir_all(root_dir.join(GENERATIONS_DIR)).await?;

        let mut store = Self {
            root_dir,
            memory: MemoryStore::new(),
        };

        if let Some(pointer) = store.read_json::<GenerationPointer>(POINTER_KEY).await? {
            let generation: Generation = store.read_json(&pointer.file).await?.ok_or_else(|| {
                AppError::store(format!(
                    "{} points at {} which does not exist",
                    POINTER_KEY, pointer.file
                ))
            })?;
            log::info!(
                "Loaded generation {} ({} documents) from {}",
                generation.tag,
                generation.documents.len(),
                store.root_dir.display()
            );
            store.memory = MemoryStore::from_generation(generation);
        } else {
            log::info!(
                "No generation found under {}; starting empty",
                store.root_dir.display()
            );
        }

        Ok(store)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    fn generation_key(tag: u64) -> String {
        format!("{GENERATIONS_DIR}/{tag:016x}.json")
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Persist `generation` and point `current.json` at it.
    async fn persist(&self, generation: &Generation) -> Result<()> {
        let key = Self::generation_key(generation.tag);
        self.write_json(&key, generation).await?;

        let pointer = GenerationPointer {
            generation: generation.tag,
            file: key,
            count: generation.documents.len(),
            updated_at: generation.updated_at,
        };
        self.write_json(POINTER_KEY, &pointer).await
    }

    /// Remove generation files other than `live_tag`. Failures are logged.
    async fn collect_garbage(&self, live_tag: u64) {
        let live = format!("{live_tag:016x}.json");
        let dir = self.path(GENERATIONS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Cannot list {}: {}", dir.display(), e);
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if name.to_string_lossy() == live {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => log::debug!("Removed stale generation {}", entry.path().display()),
                Err(e) => log::warn!(
                    "Failed to remove stale generation {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }
    }

    /// Persist then publish a single-document change.
    async fn commit(&self, next: Generation) -> Result<()> {
        self.persist(&next).await?;
        self.memory.publish(next);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn find_all(&self, filter: &Filter) -> Result<Vec<RawDocument>> {
        self.memory.find_all(filter).await
    }

    async fn replace_all(&self, documents: Vec<RawDocument>) -> Result<ReplaceSummary> {
        let _writer = self.memory.lock_writer().await;
        let staged = self.memory.stage(documents);
        let summary = MemoryStore::summary(&staged);

        self.persist(&staged).await?;
        self.memory.publish(staged);
        log::info!(
            "Generation {} live: {} documents in {}",
            summary.generation,
            summary.count,
            self.root_dir.display()
        );

        self.collect_garbage(summary.generation).await;
        Ok(summary)
    }

    async fn insert_one(&self, mut document: RawDocument) -> Result<DocumentId> {
        check_payload(&document)?;
        let _writer = self.memory.lock_writer().await;
        let id = self.memory.next_id();
        document.set(ID_FIELD, id.as_str());
        self.commit(self.memory.snapshot().with_inserted(document))
            .await?;
        Ok(id)
    }

    async fn update_one(&self, id: &DocumentId, patch: RawDocument) -> Result<u64> {
        check_payload(&patch)?;
        let _writer = self.memory.lock_writer().await;
        match self.memory.snapshot().with_updated(id, &patch) {
            Some(next) => {
                self.commit(next).await?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: &DocumentId) -> Result<u64> {
        let _writer = self.memory.lock_writer().await;
        match self.memory.snapshot().with_deleted(id) {
            Some(next) => {
                self.commit(next).await?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn stats(&self) -> Result<CollectionStats> {
        self.memory.stats().await
    }

    async fn distinct_values(&self, field: &str) -> Result<Vec<String>> {
        self.memory.distinct_values(field).await
    }

    async fn ping(&self) -> Result<()> {
        let metadata = tokio::fs::metadata(&self.root_dir).await?;
        if !metadata.is_dir() {
            return Err(AppError::store(format!(
                "{} is not a directory",
                self.root_dir.display()
            )));
        }
        Ok(())
    }
}
