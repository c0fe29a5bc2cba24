//! Registry — validated control-plane operations over the state store.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use probe_core::canonical_target_id;
use probegrid_state::{
    Credentials, ServiceMeta, StateError, StateStore, TargetAssignment,
};

use crate::error::{RegistryError, RegistryResult};

/// Registration request for a monitored-service type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    /// Probe protocol family: "mongodb", "redis", "http_json", etc.
    pub db_type: String,
    /// Probe command names, in execution order.
    pub commands: Vec<String>,
    /// Historical samples retained per target.
    pub sample_count: u32,
    /// Polling period in seconds.
    pub interval_seconds: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Control-plane operations for service registration and target assignment.
#[derive(Clone)]
pub struct Registry {
    store: StateStore,
}

impl Registry {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Register a new service type.
    ///
    /// Creates the service metadata and an empty target set, and makes sure
    /// the worker-id counter exists (initialized to 0 only on the very first
    /// registration — re-registration attempts never reset it).
    pub fn register_service(&self, spec: ServiceSpec) -> RegistryResult<ServiceMeta> {
        let meta = validate(spec)?;
        self.store.register_service(&meta).map_err(|e| match e {
            StateError::AlreadyExists(name) => RegistryError::AlreadyExists(name),
            other => RegistryError::State(other),
        })?;
        info!(service = %meta.service, db_type = %meta.db_type, "service registered");
        Ok(meta)
    }

    /// Service metadata by name.
    pub fn get_service(&self, service: &str) -> RegistryResult<ServiceMeta> {
        self.store
            .get_service(service)?
            .ok_or_else(|| RegistryError::NotFound(service.to_string()))
    }

    /// Metadata for every registered service type.
    pub fn list_services(&self) -> RegistryResult<Vec<ServiceMeta>> {
        Ok(self.store.list_services()?)
    }

    /// Remove a service type and its target set. Returns true if it existed.
    pub fn remove_service(&self, service: &str) -> RegistryResult<bool> {
        let existed = self.store.remove_service(service)?;
        if existed {
            info!(service, "service removed");
        }
        Ok(existed)
    }

    /// Assign a `host:port` target of a service to the next collector worker.
    ///
    /// The target id is canonicalized before storage; assigning an id that
    /// already exists overwrites it (last write wins) and draws a fresh
    /// worker id.
    pub fn assign_target(
        &self,
        service: &str,
        host: &str,
        port: u16,
    ) -> RegistryResult<TargetAssignment> {
        let target_id = canonical_target_id(host, port);
        let assignment = self.store.assign_target(service, &target_id)?;
        info!(
            service,
            target = %assignment.target_id,
            worker = assignment.worker_id,
            "target assigned"
        );
        Ok(assignment)
    }

    /// Move an existing target onto a fresh worker id.
    pub fn reassign_target(
        &self,
        service: &str,
        target_id: &str,
    ) -> RegistryResult<TargetAssignment> {
        let assignment = self.store.reassign_target(service, target_id)?;
        info!(
            service,
            target = target_id,
            worker = assignment.worker_id,
            "target reassigned"
        );
        Ok(assignment)
    }

    /// Record the collector pid that picked up a target.
    pub fn claim_target(
        &self,
        service: &str,
        target_id: &str,
        process_id: u32,
    ) -> RegistryResult<TargetAssignment> {
        Ok(self.store.claim_target(service, target_id, process_id)?)
    }

    /// Remove a target entry. Returns true if it existed.
    pub fn remove_target(&self, service: &str, target_id: &str) -> RegistryResult<bool> {
        Ok(self.store.remove_target(service, target_id)?)
    }

    /// Snapshot of a service's target assignments. Pure read.
    pub fn list_assignments(&self, service: &str) -> RegistryResult<Vec<TargetAssignment>> {
        let record = self
            .store
            .get_assignments(service)?
            .ok_or_else(|| RegistryError::NotFound(service.to_string()))?;
        Ok(record.targets.into_values().collect())
    }

    /// Current worker-id counter value.
    pub fn worker_counter(&self) -> RegistryResult<u64> {
        Ok(self.store.worker_counter()?)
    }
}

/// Check a registration request and shape it into the stored record.
fn validate(spec: ServiceSpec) -> RegistryResult<ServiceMeta> {
    if spec.name.trim().is_empty() {
        return Err(RegistryError::InvalidSpec("empty service name".into()));
    }
    if spec.db_type.trim().is_empty() {
        return Err(RegistryError::InvalidSpec("empty db_type".into()));
    }
    if spec.sample_count == 0 {
        return Err(RegistryError::InvalidSpec("sample_count must be > 0".into()));
    }
    if spec.interval_seconds == 0 {
        return Err(RegistryError::InvalidSpec(
            "interval_seconds must be > 0".into(),
        ));
    }

    let commands = dedupe_commands(spec.commands);
    if commands.is_empty() {
        warn!(service = %spec.name, "registration rejected: no probe commands");
        return Err(RegistryError::InvalidSpec("no probe commands".into()));
    }

    Ok(ServiceMeta {
        service: spec.name,
        db_type: spec.db_type,
        commands,
        sample_count: spec.sample_count,
        interval_seconds: spec.interval_seconds,
        credentials: Credentials {
            username: spec.username.unwrap_or_default(),
            password: spec.password.unwrap_or_default(),
        },
    })
}

/// Drop duplicate command names, keeping the first occurrence in order.
fn dedupe_commands(commands: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    commands
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
