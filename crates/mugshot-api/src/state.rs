//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`, and to avoid a single god object.

use mugshot_core::{Config, SessionStore, UserStore};
use mugshot_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::AvatarIngestService;

// ----- Sub-state types -----

/// Database pool and identity stores.
#[derive(Clone)]
pub struct DbState {
    /// Present when backed by Postgres. Store-injected builds (tests) run
    /// without a pool; the readiness probe reports the database as
    /// not configured instead of probing it.
    pub pool: Option<PgPool>,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserStore>,
}

/// Avatar ingestion service and the storage it writes to.
#[derive(Clone)]
pub struct AvatarState {
    pub service: Arc<AvatarIngestService>,
    pub storage: Arc<dyn Storage>,
}

/// Security configuration (CORS, proxy trust).
#[derive(Clone)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub trusted_proxy_count: usize,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub avatars: AvatarState,
    pub security: SecurityConfig,
    pub config: Config,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for AvatarState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.avatars.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for SecurityConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.security.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
