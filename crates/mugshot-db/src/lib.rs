//! Mugshot Database Library
//!
//! Postgres repositories backing the [`mugshot_core::stores`] traits.

pub mod db;

pub use db::{SessionRepository, UserRepository};
