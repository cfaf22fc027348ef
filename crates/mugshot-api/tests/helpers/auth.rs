//! User and session seeding for authenticated requests.

use chrono::{Duration, Utc};
use mugshot_core::models::{Session, User};
use uuid::Uuid;

use super::TestApp;

/// A seeded user together with a session token for requests.
pub struct TestUser {
    pub user: User,
    pub token: String,
}

/// Seed a user with a live session. The profile image starts at the
/// configured default avatar.
pub fn seed_user(app: &TestApp) -> TestUser {
    seed_user_with_session_offset(app, Duration::hours(app.config.session_ttl_hours))
}

/// Seed a user whose session already expired.
pub fn seed_user_with_expired_session(app: &TestApp) -> TestUser {
    seed_user_with_session_offset(app, Duration::hours(-1))
}

fn seed_user_with_session_offset(app: &TestApp, expires_in: Duration) -> TestUser {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: format!("user-{}@example.com", Uuid::new_v4().simple()),
        profile_image: app.config.avatar.default_image.clone(),
        created_at: now,
        updated_at: now,
    };
    app.users.insert(user.clone());

    let token = format!("test-session-{}", Uuid::new_v4().simple());
    app.sessions.insert(Session {
        token: token.clone(),
        user_id: user.id,
        created_at: now,
        expires_at: now + expires_in,
    });

    TestUser { user, token }
}
