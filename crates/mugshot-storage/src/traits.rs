//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Stream exceeded the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A successfully stored avatar object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAvatar {
    /// Internal storage key the object was written under
    pub key: String,
    /// Public path under which the object is served
    pub public_path: String,
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// The ingestion pipeline streams fetched bodies through this trait without
/// coupling to a specific backend. Writes must be atomic with respect to the
/// destination key: a failed or truncated stream never replaces an existing
/// object.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream a body into the object at `key`, replacing any previous object.
    ///
    /// When `max_bytes` is set, a stream that would exceed it is aborted with
    /// [`StorageError::TooLarge`] and the destination is left untouched.
    async fn put_stream(
        &self,
        key: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        max_bytes: Option<u64>,
    ) -> StorageResult<StoredAvatar>;

    /// Delete the object at `key`. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Public path under which the object at `key` is served
    fn public_path(&self, key: &str) -> String;
}
