//! Mugshot Core Library
//!
//! This crate provides core domain models, error types, configuration, and the
//! URL admission policy that are shared across all Mugshot components.

pub mod config;
pub mod error;
pub mod models;
pub mod stores;
pub mod validation;

// Re-export commonly used types
pub use config::{AvatarConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use stores::{SessionStore, UserStore};
pub use validation::{infer_extension, UrlPolicy, UrlRejection, ValidatedUrl};
