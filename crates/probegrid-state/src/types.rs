//! Record types for the ProbeGrid state store.
//!
//! These types represent the persisted state of monitored-service types and
//! their target assignments. All types are serializable to/from JSON for
//! storage in redb tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique name of a monitored-service type ("mongodb", "redis", ...).
pub type ServiceName = String;

/// Canonical target identifier (`host` flattened, `:{port}` suffix).
pub type TargetId = String;

/// Identifier of the collector worker that owns a target.
pub type WorkerId = u64;

// ── Service metadata ──────────────────────────────────────────────

/// Probe policy for one monitored-service type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceMeta {
    pub service: ServiceName,
    /// Probe protocol family: "mongodb", "redis", "http_json", etc.
    pub db_type: String,
    /// Probe command names, in execution order.
    pub commands: Vec<String>,
    /// Historical samples retained per target.
    pub sample_count: u32,
    /// Polling period in seconds.
    pub interval_seconds: u64,
    /// Auth used by the collector fleet against targets. Empty by default.
    #[serde(default)]
    pub credentials: Credentials,
}

/// Username/password pair for probing authenticated targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

// ── Task assignments ──────────────────────────────────────────────

/// The live target set of one service type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskAssignment {
    pub service: ServiceName,
    /// Targets keyed by canonical target id.
    pub targets: BTreeMap<TargetId, TargetAssignment>,
}

impl TaskAssignment {
    /// A freshly registered service has no targets yet.
    pub fn empty(service: &str) -> Self {
        Self {
            service: service.to_string(),
            targets: BTreeMap::new(),
        }
    }
}

/// One target pinned to a collector worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetAssignment {
    pub target_id: TargetId,
    /// Worker that owns this target. Drawn from the worker-id counter;
    /// stable until the target is reassigned or overwritten.
    pub worker_id: WorkerId,
    /// OS pid of the collector process that claimed the target.
    /// 0 until a collector picks it up.
    pub process_id: u32,
}
