use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

use crate::traits::{Storage, StorageError, StorageResult, StoredAvatar};

/// Local filesystem storage implementation
///
/// Objects are written to a temp file beside the destination and renamed into
/// place, so readers and concurrent writers only ever observe complete files.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    public_base: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/mugshot/media")
    /// * `public_base` - Path prefix under which files are served (e.g., "/media")
    pub async fn new(base_path: impl Into<PathBuf>, public_base: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            public_base,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// This function validates that the storage key doesn't contain path traversal
    /// sequences that could escape the base storage directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(key);

        // Existing paths additionally get a canonical prefix check, which
        // catches symlinks pointing out of the storage root
        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_capped(
        &self,
        tmp_path: &Path,
        reader: &mut Pin<Box<dyn AsyncRead + Send + Unpin>>,
        max_bytes: Option<u64>,
    ) -> StorageResult<u64> {
        let mut file = fs::File::create(tmp_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        let bytes_copied = match max_bytes {
            Some(limit) => {
                // Read one byte past the limit to tell exactly-at-limit from over it
                let mut limited = reader.take(limit + 1);
                let copied = tokio::io::copy(&mut limited, &mut file).await.map_err(|e| {
                    StorageError::UploadFailed(format!(
                        "Failed to write stream to file {}: {}",
                        tmp_path.display(),
                        e
                    ))
                })?;
                if copied > limit {
                    return Err(StorageError::TooLarge { limit });
                }
                copied
            }
            None => tokio::io::copy(reader, &mut file).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    tmp_path.display(),
                    e
                ))
            })?,
        };

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        Ok(bytes_copied)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_stream(
        &self,
        key: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        max_bytes: Option<u64>,
    ) -> StorageResult<StoredAvatar> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey("Storage key has no file name".to_string()))?;

        // Temp file in the destination directory so the final rename stays on
        // one filesystem
        let tmp_path =
            path.with_file_name(format!(".{}.{}.part", file_name, Uuid::new_v4().simple()));

        let size_bytes = match self.write_capped(&tmp_path, &mut reader, max_bytes).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move {} into place: {}",
                path.display(),
                e
            )));
        }

        let public_path = self.public_path(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(StoredAvatar {
            key: key.to_string(),
            public_path,
            size_bytes,
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn public_path(&self, key: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), key)
    }
}
