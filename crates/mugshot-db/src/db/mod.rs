//! Database repositories for data access layer
//!
//! Each repository owns the queries for one entity and implements the
//! corresponding store trait from `mugshot-core`.

pub mod sessions;
pub mod users;

pub use sessions::SessionRepository;
pub use users::UserRepository;
