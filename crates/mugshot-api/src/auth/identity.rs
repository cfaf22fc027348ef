//! Session-token authentication middleware.
//!
//! Every protected route runs through [`identity_middleware`], which resolves
//! the session token to a user and stores a [`RequestIdentity`] in request
//! extensions. Rejected requests are answered with 401 and logged together
//! with the client address, since unauthenticated calls against the avatar
//! endpoint are a standing probe target.

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use mugshot_core::{AppError, SessionStore};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::utils::client_ip::{client_ip, ClientIp};

/// Cookie carrying the session token for browser clients.
const SESSION_COOKIE: &str = "token";

/// State for the identity middleware.
#[derive(Clone)]
pub struct IdentityState {
    pub sessions: Arc<dyn SessionStore>,
    pub trusted_proxy_count: usize,
}

/// Authenticated caller, stored in request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub user_id: Uuid,
    pub client_ip: ClientIp,
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing request identity".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_IDENTITY".to_string(),
                        recoverable: false,
                        suggested_action: Some("Check session token".to_string()),
                    }),
                )
            })
    }
}

pub async fn identity_middleware(
    State(identity_state): State<Arc<IdentityState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client_ip = client_ip(
        request.headers(),
        peer.as_ref(),
        identity_state.trusted_proxy_count,
    );

    let token = match session_token(request.headers()) {
        Some(token) => token,
        None => {
            tracing::warn!(
                client_ip = %client_ip,
                path = %request.uri().path(),
                "Rejected request without a session token"
            );
            return HttpAppError(AppError::Unauthorized(
                "Missing session token".to_string(),
            ))
            .into_response();
        }
    };

    let session = match identity_state.sessions.lookup(&token).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::warn!(
                client_ip = %client_ip,
                path = %request.uri().path(),
                "Rejected request with an unknown or expired session token"
            );
            return HttpAppError(AppError::Unauthorized(
                "Invalid or expired session".to_string(),
            ))
            .into_response();
        }
        Err(e) => {
            return HttpAppError(e).into_response();
        }
    };

    request.extensions_mut().insert(RequestIdentity {
        user_id: session.user_id,
        client_ip,
    });
    next.run(request).await
}

/// Extract the session token from the Authorization header or, for browser
/// clients, the `token` cookie. The header wins when both are present.
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    let cookies = headers.get(header::COOKIE).and_then(|h| h.to_str().ok())?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}
