//! probegrid-state — embedded state store for ProbeGrid.
//!
//! Backed by [redb](https://docs.rs/redb), holds the two record families the
//! collector fleet is driven by: service metadata (which probe commands to
//! run, how often, how much history to keep) and task assignments (which
//! collector worker owns which `host:port` target).
//!
//! # Architecture
//!
//! Record types are JSON-serialized into redb's `&[u8]` value columns, keyed
//! by service type name. Worker ids come from a native-`u64` counter row that
//! is only ever touched inside the same write transaction as the assignment
//! it pays for, so concurrent assignments can never observe the same value.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
