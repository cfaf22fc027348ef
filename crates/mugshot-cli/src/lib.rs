//! Shared helpers for the Mugshot CLI binary.

use uuid::Uuid;

/// A user reference given on the command line: UUID or email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(Uuid),
    Email(String),
}

/// Interpret an argument as a user UUID when it parses as one, otherwise as
/// an email address.
pub fn parse_user_ref(raw: &str) -> UserRef {
    let trimmed = raw.trim();
    match Uuid::parse_str(trimmed) {
        Ok(id) => UserRef::Id(id),
        Err(_) => UserRef::Email(trimmed.to_string()),
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_ref_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_user_ref(&id.to_string()), UserRef::Id(id));
    }

    #[test]
    fn parse_user_ref_uuid_with_whitespace() {
        let id = Uuid::new_v4();
        assert_eq!(parse_user_ref(&format!("  {}  ", id)), UserRef::Id(id));
    }

    #[test]
    fn parse_user_ref_email() {
        assert_eq!(
            parse_user_ref("ops@example.com"),
            UserRef::Email("ops@example.com".to_string())
        );
    }

    #[test]
    fn parse_user_ref_almost_uuid_is_email() {
        // One character short of a UUID
        assert_eq!(
            parse_user_ref("123e4567-e89b-12d3-a456-42661417400"),
            UserRef::Email("123e4567-e89b-12d3-a456-42661417400".to_string())
        );
    }
}
