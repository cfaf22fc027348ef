//! Configuration module
//!
//! This module provides configuration structures for the API and CLI,
//! including database, storage, and avatar-ingestion settings.

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SESSION_TTL_HOURS: i64 = 24;
const SESSION_PRUNE_INTERVAL_SECS: u64 = 3600;
const TRUSTED_PROXY_COUNT: usize = 1;

/// Avatar ingestion configuration
#[derive(Clone, Debug)]
pub struct AvatarConfig {
    /// Filesystem root where fetched avatars are written
    pub storage_path: String,
    /// URL prefix under which stored avatars are served
    pub public_base: String,
    /// Profile image applied when a fetch cannot be completed
    pub default_image: String,
    pub allowed_schemes: Vec<String>,
    pub host_allowlist: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub fetch_timeout_seconds: u64,
    pub max_download_bytes: u64,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Prefix prepended to redirect targets, e.g. "" or "/app"
    pub base_path: String,
    pub trusted_proxy_count: usize,
    pub session_ttl_hours: i64,
    /// Interval between expired-session sweeps. 0 = disabled.
    pub session_prune_interval_secs: u64,
    pub avatar: AvatarConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const FETCH_TIMEOUT_SECS: u64 = 10;
        const MAX_DOWNLOAD_MB: u64 = 5;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let allowed_schemes = env::var("AVATAR_ALLOWED_SCHEMES")
            .unwrap_or_else(|_| "https".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let host_allowlist = env::var("AVATAR_HOST_ALLOWLIST")
            .unwrap_or_else(|_| "secure.gravatar.com".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_extensions = env::var("AVATAR_ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "jpg,jpeg,png,svg,gif".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let avatar = AvatarConfig {
            storage_path: env::var("AVATAR_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/avatars".to_string()),
            public_base: env::var("AVATAR_PUBLIC_BASE").unwrap_or_else(|_| "/media".to_string()),
            default_image: env::var("AVATAR_DEFAULT_IMAGE")
                .unwrap_or_else(|_| "/media/defaults/avatar.svg".to_string()),
            allowed_schemes,
            host_allowlist,
            allowed_extensions,
            fetch_timeout_seconds: env::var("AVATAR_FETCH_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(FETCH_TIMEOUT_SECS),
            max_download_bytes: env::var("AVATAR_MAX_DOWNLOAD_MB")
                .unwrap_or_else(|_| MAX_DOWNLOAD_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_DOWNLOAD_MB)
                * 1024
                * 1024,
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            base_path: env::var("BASE_PATH")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|_| TRUSTED_PROXY_COUNT.to_string())
                .parse()
                .unwrap_or(TRUSTED_PROXY_COUNT),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| SESSION_TTL_HOURS.to_string())
                .parse()
                .unwrap_or(SESSION_TTL_HOURS),
            session_prune_interval_secs: env::var("SESSION_PRUNE_INTERVAL_SECONDS")
                .unwrap_or_else(|_| SESSION_PRUNE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(SESSION_PRUNE_INTERVAL_SECS),
            avatar,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.avatar.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!("AVATAR_STORAGE_PATH cannot be empty"));
        }

        // The public base doubles as a route mount point
        if !self.avatar.public_base.starts_with('/') {
            return Err(anyhow::anyhow!(
                "AVATAR_PUBLIC_BASE must start with '/', got '{}'",
                self.avatar.public_base
            ));
        }

        if self.avatar.allowed_schemes.is_empty() {
            return Err(anyhow::anyhow!(
                "AVATAR_ALLOWED_SCHEMES must contain at least one scheme"
            ));
        }

        for scheme in &self.avatar.allowed_schemes {
            if scheme != "http" && scheme != "https" {
                return Err(anyhow::anyhow!(
                    "AVATAR_ALLOWED_SCHEMES only supports http and https, got '{}'",
                    scheme
                ));
            }
        }

        if self.avatar.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "AVATAR_ALLOWED_EXTENSIONS must contain at least one extension"
            ));
        }

        if self.avatar.fetch_timeout_seconds == 0 {
            return Err(anyhow::anyhow!(
                "AVATAR_FETCH_TIMEOUT_SECONDS must be greater than zero"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn avatar(&self) -> &AvatarConfig {
        &self.avatar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 8080,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            database_url: "postgresql://localhost/mugshot".to_string(),
            db_max_connections: 20,
            db_timeout_seconds: 30,
            base_path: String::new(),
            trusted_proxy_count: 1,
            session_ttl_hours: 24,
            session_prune_interval_secs: 3600,
            avatar: AvatarConfig {
                storage_path: "./data/avatars".to_string(),
                public_base: "/media".to_string(),
                default_image: "/media/defaults/avatar.svg".to_string(),
                allowed_schemes: vec!["https".to_string()],
                host_allowlist: vec!["secure.gravatar.com".to_string()],
                allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
                fetch_timeout_seconds: 10,
                max_download_bytes: 5 * 1024 * 1024,
            },
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_postgres_url() {
        let mut config = test_config();
        config.database_url = "mysql://localhost/mugshot".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_public_base() {
        let mut config = test_config();
        config.avatar.public_base = "media".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_scheme() {
        let mut config = test_config();
        config.avatar.allowed_schemes = vec!["ftp".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = test_config();
        config.avatar.fetch_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
        config.environment = "prod".to_string();
        assert!(config.is_production());
    }
}
