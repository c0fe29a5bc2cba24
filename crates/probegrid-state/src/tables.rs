//! redb table definitions for the ProbeGrid state store.
//!
//! Record tables use `&str` keys (the service type name) and `&[u8]` values
//! (JSON-serialized record types). Counters live in their own native-`u64`
//! table so increments need no serialization round trip.

use redb::TableDefinition;

/// Service metadata keyed by `{service}`.
pub const SERVICE_META: TableDefinition<&str, &[u8]> = TableDefinition::new("service_meta");

/// Task assignments keyed by `{service}`.
pub const TASK_ASSIGNMENTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("task_assignments");

/// Named counters keyed by `{counter}`.
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// The counter row that hands out sequential collector worker ids.
pub const WORKER_ID_COUNTER: &str = "worker_id";
