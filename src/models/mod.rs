//! Data models for the sync service.

pub mod config;
pub mod department;
pub mod document;
pub mod metadata;
pub mod student;

pub use config::{
    Config, LoggingConfig, ServerConfig, SourceConfig, StorageBackend, StorageConfig, SyncConfig,
};
pub use department::{Category, Department};
pub use document::{DocumentId, ID_FIELD, RawDocument, SYNCED_AT_FIELD};
pub use metadata::{CollectionStats, SyncMetadata, SyncStatus};
pub use student::{Status, Student};
