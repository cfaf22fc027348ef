//! Remote avatar ingestion service
//!
//! Orchestrates the profile-image-from-URL pipeline: admit the URL, fetch the
//! remote body, verify it is an image, stream it into storage under a
//! per-user key, then point the user record at the stored file.
//!
//! Failures split into two classes. Admission failures surface to the caller
//! before any network access. Remote-leg failures (fetch errors, non-image
//! payloads, oversized bodies) do not fail the request: the user record falls
//! back to the configured default avatar instead.

use std::sync::Arc;

use mugshot_core::models::User;
use mugshot_core::{infer_extension, AppError, AvatarConfig, UrlPolicy, UserStore};
use mugshot_storage::{Storage, StorageError};
use uuid::Uuid;

use crate::fetch::ImageFetcher;

/// How a completed ingestion request resolved
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The remote image was stored and the record points at it
    Updated(User),
    /// The remote leg failed; the record points at the default avatar
    FallbackApplied(User),
}

impl IngestOutcome {
    pub fn user(&self) -> &User {
        match self {
            IngestOutcome::Updated(user) | IngestOutcome::FallbackApplied(user) => user,
        }
    }
}

/// Service orchestrating remote avatar ingestion
///
/// Keeps handler logic thin and allows exercising the pipeline without HTTP.
pub struct AvatarIngestService {
    policy: UrlPolicy,
    fetcher: Arc<dyn ImageFetcher>,
    storage: Arc<dyn Storage>,
    users: Arc<dyn UserStore>,
    avatar: AvatarConfig,
}

impl AvatarIngestService {
    pub fn new(
        policy: UrlPolicy,
        fetcher: Arc<dyn ImageFetcher>,
        storage: Arc<dyn Storage>,
        users: Arc<dyn UserStore>,
        avatar: AvatarConfig,
    ) -> Self {
        Self {
            policy,
            fetcher,
            storage,
            users,
            avatar,
        }
    }

    /// Complete ingestion workflow: validate → fetch → verify → store → update
    pub async fn ingest_from_url(
        &self,
        user_id: Uuid,
        raw_url: &str,
    ) -> Result<IngestOutcome, AppError> {
        // 1. Admit the URL. Rejections surface as client errors and nothing
        //    is fetched.
        let validated = self.policy.validate(raw_url)?;

        let extension = infer_extension(&validated, &self.avatar.allowed_extensions);
        let key = avatar_key(user_id, &extension);

        // 2. Fetch the remote body. Redirects are not followed, so a 3xx
        //    answer lands here as a bad status.
        let fetched = match self.fetcher.fetch_image(validated.as_url()).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    url = %validated,
                    error = %e,
                    "Avatar fetch failed, applying default image"
                );
                return self.apply_fallback(user_id).await;
            }
        };

        // 3. Verify the remote served an image
        if !fetched.content_type.starts_with("image/") {
            tracing::warn!(
                user_id = %user_id,
                url = %validated,
                content_type = %fetched.content_type,
                "Remote did not serve an image, applying default image"
            );
            return self.apply_fallback(user_id).await;
        }

        // Content-Length is advisory; the capped write below is what enforces
        // the limit.
        if let Some(length) = fetched.content_length {
            if length > self.avatar.max_download_bytes {
                tracing::warn!(
                    user_id = %user_id,
                    url = %validated,
                    content_length = length,
                    limit = self.avatar.max_download_bytes,
                    "Remote image exceeds the download limit, applying default image"
                );
                return self.apply_fallback(user_id).await;
            }
        }

        // 4. Stream into storage under the per-user key
        let stored = match self
            .storage
            .put_stream(&key, fetched.body, Some(self.avatar.max_download_bytes))
            .await
        {
            Ok(stored) => stored,
            Err(StorageError::TooLarge { limit }) => {
                tracing::warn!(
                    user_id = %user_id,
                    url = %validated,
                    limit,
                    "Remote image exceeded the download limit mid-stream, applying default image"
                );
                return self.apply_fallback(user_id).await;
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    key = %key,
                    error = %e,
                    "Failed to store fetched avatar"
                );
                return Err(AppError::Storage(e.to_string()));
            }
        };

        // 5. Point the user record at the stored file
        let user = match self
            .users
            .update_profile_image(user_id, &stored.public_path)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                // The freshly written file stays behind; the next successful
                // ingest for this user overwrites it.
                tracing::error!(
                    user_id = %user_id,
                    key = %key,
                    error = %e,
                    "Avatar stored but the user record update failed"
                );
                return Err(e);
            }
        };

        // 6. Remove files left under other extensions by earlier ingests
        self.remove_superseded(user_id, &extension).await;

        tracing::info!(
            user_id = %user_id,
            url = %validated,
            profile_image = %user.profile_image,
            size_bytes = stored.size_bytes,
            "Profile image updated from remote URL"
        );

        Ok(IngestOutcome::Updated(user))
    }

    /// Point the user record at the configured default avatar
    async fn apply_fallback(&self, user_id: Uuid) -> Result<IngestOutcome, AppError> {
        let user = self
            .users
            .update_profile_image(user_id, &self.avatar.default_image)
            .await?;

        tracing::info!(
            user_id = %user_id,
            profile_image = %user.profile_image,
            "Default avatar applied"
        );

        Ok(IngestOutcome::FallbackApplied(user))
    }

    /// Best-effort removal of this user's files under other allowed extensions
    async fn remove_superseded(&self, user_id: Uuid, keep_extension: &str) {
        for stale in self
            .avatar
            .allowed_extensions
            .iter()
            .filter(|ext| ext.as_str() != keep_extension)
        {
            let stale_key = avatar_key(user_id, stale);
            if let Err(e) = self.storage.delete(&stale_key).await {
                tracing::debug!(
                    key = %stale_key,
                    error = %e,
                    "Could not remove superseded avatar file"
                );
            }
        }
    }
}

/// Storage key for a user's avatar under a given extension
fn avatar_key(user_id: Uuid, extension: &str) -> String {
    format!("avatars/{}.{}", user_id, extension)
}
