pub mod avatar;

pub use avatar::{AvatarIngestService, IngestOutcome};
