//! Validation modules

pub mod url_policy;

pub use url_policy::{infer_extension, UrlPolicy, UrlRejection, ValidatedUrl};
