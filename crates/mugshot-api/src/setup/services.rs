//! Service initialization and application state setup

use anyhow::Result;
use mugshot_core::{Config, SessionStore, UrlPolicy, UserStore};
use mugshot_db::{SessionRepository, UserRepository};
use mugshot_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::HttpImageFetcher;
use crate::services::AvatarIngestService;
use crate::state::{AppState, AvatarState, DbState, SecurityConfig};

/// Initialize all services and repositories, returning the application state
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let session_repository = SessionRepository::new(pool.clone());
    let user_repository = UserRepository::new(pool.clone());

    spawn_session_pruner(
        session_repository.clone(),
        config.session_prune_interval_secs,
    );

    let sessions: Arc<dyn SessionStore> = Arc::new(session_repository);
    let users: Arc<dyn UserStore> = Arc::new(user_repository);

    let fetcher = HttpImageFetcher::new(Duration::from_secs(config.avatar.fetch_timeout_seconds))?;

    let service = Arc::new(AvatarIngestService::new(
        UrlPolicy::from_avatar_config(&config.avatar),
        Arc::new(fetcher),
        storage.clone(),
        users.clone(),
        config.avatar.clone(),
    ));

    tracing::info!(
        environment = %config.environment(),
        is_production = config.is_production(),
        host_allowlist = %config.avatar.host_allowlist.join(","),
        "Avatar ingestion service initialized"
    );

    let state = Arc::new(AppState {
        db: DbState {
            pool: Some(pool),
            sessions,
            users,
        },
        avatars: AvatarState { service, storage },
        security: SecurityConfig {
            cors_origins: config.cors_origins().to_vec(),
            trusted_proxy_count: config.trusted_proxy_count,
        },
        config: config.clone(),
    });

    Ok(state)
}

/// Periodic sweep of expired session rows. Interval 0 disables the task.
fn spawn_session_pruner(repository: SessionRepository, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("Session pruning disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match repository.prune_expired().await {
                Ok(0) => {}
                Ok(pruned) => tracing::info!(pruned, "Pruned expired sessions"),
                Err(e) => tracing::error!(error = %e, "Session prune sweep failed"),
            }
        }
    });

    tracing::info!(interval_secs, "Started session prune background task");
}
