use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;
use uuid::Uuid;

use mugshot_core::error::AppError;
use mugshot_core::models::Session;
use mugshot_core::stores::SessionStore;

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mint a session for the user, valid for `ttl_hours` from now
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "insert", user_id = %user_id))]
    pub async fn create(&self, user_id: Uuid, ttl_hours: i64) -> Result<Session, AppError> {
        let now = Utc::now();
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(mint_token())
        .bind(user_id)
        .bind(now)
        .bind(now + Duration::hours(ttl_hours))
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Delete the session for `token`. Returns whether a session was removed.
    #[tracing::instrument(skip(self, token), fields(db.table = "sessions", db.operation = "delete"))]
    pub async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove expired sessions, returning how many were deleted
    #[tracing::instrument(skip(self), fields(db.table = "sessions", db.operation = "delete"))]
    pub async fn prune_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    #[tracing::instrument(skip(self, token), fields(db.table = "sessions", db.operation = "select"))]
    async fn lookup(&self, token: &str) -> Result<Option<Session>, AppError> {
        // Expiry is enforced here so callers never observe a stale session
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, created_at, expires_at
            FROM sessions
            WHERE token = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }
}

/// 256-bit random token, hex encoded
fn mint_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_token_shape() {
        let token = mint_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_mint_token_is_unique() {
        assert_ne!(mint_token(), mint_token());
    }
}
