//! Repository Layer - Core Traits
//!
//! Defines the abstract interface for local persistence.
//! Implementations can use SQLite, in-memory maps, etc.

use async_trait::async_trait;
use thiserror::Error;

/// Common result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-level errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database not initialized")]
    NotInitialized,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// String key-value store, the device-local storage behind snapshots
///
/// All operations are async to support various backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// All keys starting with `prefix`
    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
