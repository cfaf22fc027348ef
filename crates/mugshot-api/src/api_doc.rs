//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mugshot API",
        version = "0.1.0",
        description = "Profile image ingestion API. Authenticated users point their profile image at a remote URL; the server validates the URL against an admission policy, fetches it without following redirects, streams it into local storage, and falls back to a default avatar when the remote leg fails."
    ),
    paths(
        handlers::profile::get_profile,
        handlers::profile_image_url::set_profile_image_from_url,
    ),
    components(
        schemas(
            handlers::profile::ProfileResponse,
            handlers::profile_image_url::ProfileImageUrlRequest,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "profile", description = "Profile and avatar operations")
    )
)]
pub struct ApiDoc;
