use crate::auth::RequestIdentity;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::IngestOutcome;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageUrlRequest {
    /// Remote URL to fetch the new profile image from
    pub image_url: String,
}

#[utoipa::path(
    post,
    path = "/profile/image/url",
    tag = "profile",
    request_body = ProfileImageUrlRequest,
    responses(
        (status = 302, description = "Pipeline completed; redirects to the profile page. The record points at the fetched image, or at the default avatar when the remote leg failed."),
        (status = 400, description = "Malformed request body or URL", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "URL refused by the admission policy", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, body),
    fields(
        user_id = %identity.user_id,
        url = %body.image_url,
        operation = "set_profile_image_from_url"
    )
)]
pub async fn set_profile_image_from_url(
    State(state): State<Arc<AppState>>,
    identity: RequestIdentity,
    ValidatedJson(body): ValidatedJson<ProfileImageUrlRequest>,
) -> Result<Response, HttpAppError> {
    let outcome = state
        .avatars
        .service
        .ingest_from_url(identity.user_id, &body.image_url)
        .await?;

    match &outcome {
        IngestOutcome::Updated(user) => tracing::debug!(
            profile_image = %user.profile_image,
            "Avatar updated from remote URL, redirecting to profile"
        ),
        IngestOutcome::FallbackApplied(user) => tracing::debug!(
            profile_image = %user.profile_image,
            "Default avatar applied, redirecting to profile"
        ),
    }

    Ok(profile_redirect(state.config.base_path()))
}

/// 302 redirect to the profile page. Built by hand: `Redirect::to` answers
/// with 303, and clients of this flow expect 302.
fn profile_redirect(base_path: &str) -> Response {
    let target = format!("{}/profile", base_path);
    (StatusCode::FOUND, [(header::LOCATION, target)]).into_response()
}
