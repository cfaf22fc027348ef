//! Route configuration and setup

use crate::auth::{identity_middleware, IdentityState};
use crate::handlers;
use crate::state::{AppState, SecurityConfig};
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mugshot_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Request bodies carry a single URL; anything larger is rejected up front.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let cors = setup_cors(&state.security);

    let identity_state = Arc::new(IdentityState {
        sessions: state.db.sessions.clone(),
        trusted_proxy_count: state.security.trusted_proxy_count,
    });

    // Public routes (no authentication required)
    let public_routes = public_routes(config, state.clone());

    // Protected routes (require a live session)
    let protected_routes = protected_routes(state.clone()).layer(
        axum::middleware::from_fn_with_state(identity_state, identity_middleware),
    );

    let app_state_routes = public_routes.merge(protected_routes);

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    app_state_routes
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Setup CORS configuration
fn setup_cors(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}

/// Public routes (no authentication required)
fn public_routes(config: &Config, state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/health/ready",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async move { readiness_check(state).await }
                }
            }),
        )
        .with_state(state)
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        // Stored avatars are served straight from the storage root
        .nest_service(
            config.avatar.public_base.as_str(),
            ServeDir::new(&config.avatar.storage_path),
        )
}

/// Protected routes (require an authenticated session)
fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(handlers::profile::get_profile))
        .route(
            "/profile/image/url",
            post(handlers::profile_image_url::set_profile_image_from_url),
        )
        .with_state(state)
}

#[derive(serde::Serialize)]
struct ReadinessResponse {
    status: String,
    database: String,
    storage: String,
}

/// Liveness probe - simple check that the process can respond
/// Always returns 200
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Readiness probe - checks if the service can accept traffic
/// Probes the database and the storage root
async fn readiness_check(state: Arc<AppState>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = ReadinessResponse {
        status: "ready".to_string(),
        database: "unknown".to_string(),
        storage: "unknown".to_string(),
    };

    let mut overall_ready = true;

    match &state.db.pool {
        Some(pool) => {
            match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
                Ok(Ok(_)) => {
                    response.database = "ready".to_string();
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Database readiness check failed");
                    response.database = format!("not_ready: {}", e);
                    overall_ready = false;
                }
                Err(_) => {
                    tracing::error!("Database readiness check timed out");
                    response.database = "timeout".to_string();
                    overall_ready = false;
                }
            }
        }
        // Store-injected wiring has no pool to probe
        None => response.database = "not_configured".to_string(),
    }

    // Lightweight exists probe with a key that never exists; verifies the
    // storage root is reachable without creating files
    match tokio::time::timeout(
        TIMEOUT,
        state
            .avatars
            .storage
            .exists("readiness-probe-non-existent-key"),
    )
    .await
    {
        Ok(Ok(_)) => {
            response.storage = "ready".to_string();
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage readiness check warning");
            response.storage = format!("degraded: {}", e);
            // Storage issues don't fail overall readiness (graceful degradation)
        }
        Err(_) => {
            tracing::warn!("Storage readiness check timed out");
            response.storage = "timeout".to_string();
        }
    }

    if !overall_ready {
        response.status = "not_ready".to_string();
    }

    let status_code = if overall_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
