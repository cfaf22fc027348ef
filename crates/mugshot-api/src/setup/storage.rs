//! Storage setup and initialization

use anyhow::{Context, Result};
use mugshot_core::{AvatarConfig, Config};
use mugshot_storage::{LocalStorage, Storage};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Placeholder applied when a remote fetch cannot be completed. Written into
/// the storage root on startup when the configured default is missing.
const DEFAULT_AVATAR_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 128 128">
  <rect width="128" height="128" fill="#e2e8f0"/>
  <circle cx="64" cy="48" r="24" fill="#94a3b8"/>
  <path d="M16 128a48 48 0 0 1 96 0z" fill="#94a3b8"/>
</svg>
"##;

/// Setup the avatar storage backend
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!(
        storage_path = %config.avatar.storage_path,
        public_base = %config.avatar.public_base,
        "Initializing avatar storage..."
    );

    let storage = LocalStorage::new(
        config.avatar.storage_path.clone(),
        config.avatar.public_base.clone(),
    )
    .await
    .context("Failed to initialize local storage")?;
    let storage: Arc<dyn Storage> = Arc::new(storage);

    seed_default_avatar(&storage, &config.avatar).await?;

    tracing::info!("Avatar storage initialized successfully");
    Ok(storage)
}

/// Make sure the configured default avatar resolves to a real file.
///
/// Only paths under the public base can be seeded; a default pointing
/// elsewhere is assumed to be served by something outside this process.
async fn seed_default_avatar(storage: &Arc<dyn Storage>, avatar: &AvatarConfig) -> Result<()> {
    let public_base = avatar.public_base.trim_end_matches('/');
    let Some(key) = avatar
        .default_image
        .strip_prefix(public_base)
        .map(|rest| rest.trim_start_matches('/'))
        .filter(|key| !key.is_empty())
    else {
        tracing::info!(
            default_image = %avatar.default_image,
            "Default avatar lives outside the storage public base, skipping seed"
        );
        return Ok(());
    };

    if storage.exists(key).await.context("Default avatar probe failed")? {
        return Ok(());
    }

    let reader: Pin<Box<dyn AsyncRead + Send + Unpin>> =
        Box::pin(std::io::Cursor::new(DEFAULT_AVATAR_SVG));
    let stored = storage
        .put_stream(key, reader, None)
        .await
        .context("Failed to seed the default avatar")?;

    tracing::info!(
        key = %stored.key,
        public_path = %stored.public_path,
        size_bytes = stored.size_bytes,
        "Seeded default avatar"
    );
    Ok(())
}
