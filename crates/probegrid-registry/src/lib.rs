//! probegrid-registry — the operations layer over the state store.
//!
//! Implements the control-plane operations the collector fleet is driven by:
//!
//! - **register** a service type (probe commands, sampling policy) — creates
//!   its metadata and an empty target set in one shot
//! - **assign** a `host:port` target to the next collector worker via the
//!   global worker-id counter
//! - **reassign**, **claim**, **remove** targets; **list** assignments
//!
//! Validation and target-id canonicalization happen here; atomicity is
//! delegated to `probegrid_state::StateStore` (every operation is a single
//! store transaction).

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{Registry, ServiceSpec};
