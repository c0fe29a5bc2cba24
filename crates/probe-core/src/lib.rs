pub mod manifest;
pub mod target;

pub use manifest::{SeedManifest, SeedService};
pub use target::{canonical_target_id, parse_target};
