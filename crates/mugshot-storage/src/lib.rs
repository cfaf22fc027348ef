//! Mugshot Storage Library
//!
//! Byte sinks for fetched avatar images. All backends implement the
//! [`Storage`] trait; production uses the local filesystem backend.
//!
//! **Key format:** avatar objects are keyed `avatars/{user_id}.{ext}`. Keys
//! are relative paths under the storage root; traversal sequences are
//! rejected.

mod local;
mod traits;

pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult, StoredAvatar};
