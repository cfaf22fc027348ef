//! Persistence-facing traits
//!
//! The ingestion pipeline talks to users and sessions through these traits so
//! the HTTP layer can be exercised against in-memory implementations while
//! production wires in the Postgres repositories from `mugshot-db`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Session, User};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a bearer token to its live session. Expired sessions are
    /// reported as absent.
    async fn lookup(&self, token: &str) -> Result<Option<Session>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Replace the user's profile image reference, returning the updated row.
    async fn update_profile_image(&self, id: Uuid, profile_image: &str)
        -> Result<User, AppError>;
}
