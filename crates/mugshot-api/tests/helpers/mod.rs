//! Test helpers: build AppState and router for integration tests.
//!
//! The router is exercised over in-memory stores and a stubbed fetcher, so
//! tests need no Postgres, Docker, or outbound network access.
//! Run from workspace root: `cargo test -p mugshot-api --test profile_image_test`.

pub mod auth;
pub mod fetch_stub;
pub mod fixtures;
pub mod stores;

use axum_test::TestServer;
use mugshot_api::fetch::ImageFetcher;
use mugshot_api::services::AvatarIngestService;
use mugshot_api::setup::routes;
use mugshot_api::state::{AppState, AvatarState, DbState, SecurityConfig};
use mugshot_core::{AvatarConfig, Config, SessionStore, UrlPolicy, UserStore};
use mugshot_storage::{LocalStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use fetch_stub::StubFetcher;
use stores::{MemorySessionStore, MemoryUserStore};

/// Hostname admitted by the test URL policy.
pub const ALLOWED_HOST: &str = "images.example.com";

/// Download cap used by the test config.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024;

/// Test application: server, handles on the in-memory backends, and the owned
/// storage root.
pub struct TestApp {
    pub server: TestServer,
    pub sessions: Arc<MemorySessionStore>,
    pub users: Arc<MemoryUserStore>,
    pub fetcher: Arc<StubFetcher>,
    pub config: Config,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Filesystem path of the stored object at `key`.
    pub fn storage_file(&self, key: &str) -> PathBuf {
        self.temp_dir.path().join(key)
    }
}

/// Setup a test app over in-memory stores, a stub fetcher, and tempdir storage.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Same as [`setup_test_app`], but lets the test adjust the config first.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let mut config = create_test_config(temp_dir.path());
    customize(&mut config);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), config.avatar.public_base.clone())
            .await
            .expect("Failed to create local storage"),
    );

    let sessions = Arc::new(MemorySessionStore::new());
    let users = Arc::new(MemoryUserStore::new());
    let fetcher = Arc::new(StubFetcher::new());

    let session_store: Arc<dyn SessionStore> = sessions.clone();
    let user_store: Arc<dyn UserStore> = users.clone();
    let image_fetcher: Arc<dyn ImageFetcher> = fetcher.clone();

    let service = AvatarIngestService::new(
        UrlPolicy::from_avatar_config(&config.avatar),
        image_fetcher,
        storage.clone(),
        user_store.clone(),
        config.avatar.clone(),
    );

    let state = Arc::new(AppState {
        db: DbState {
            pool: None,
            sessions: session_store,
            users: user_store,
        },
        avatars: AvatarState {
            service: Arc::new(service),
            storage,
        },
        security: SecurityConfig {
            cors_origins: config.cors_origins.clone(),
            trusted_proxy_count: config.trusted_proxy_count,
        },
        config: config.clone(),
    });

    let app = routes::setup_routes(&config, state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        sessions,
        users,
        fetcher,
        config,
        temp_dir,
    }
}

fn create_test_config(storage_path: &Path) -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgresql://localhost/mugshot_test".to_string(),
        db_max_connections: 5,
        db_timeout_seconds: 30,
        base_path: String::new(),
        trusted_proxy_count: 1,
        session_ttl_hours: 24,
        session_prune_interval_secs: 0,
        avatar: AvatarConfig {
            storage_path: storage_path.display().to_string(),
            public_base: "/media".to_string(),
            default_image: "/media/defaults/avatar.svg".to_string(),
            allowed_schemes: vec!["https".to_string()],
            host_allowlist: vec![ALLOWED_HOST.to_string()],
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "svg".to_string(),
                "gif".to_string(),
            ],
            fetch_timeout_seconds: 5,
            max_download_bytes: MAX_DOWNLOAD_BYTES,
        },
    }
}
