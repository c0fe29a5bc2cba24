//! StateStore — redb-backed persistence for ProbeGrid.
//!
//! Provides typed operations over service metadata, task assignments, and
//! the worker-id counter. Record values are JSON-serialized into redb's
//! `&[u8]` value columns. The store supports both on-disk and in-memory
//! backends (the latter for testing).
//!
//! Every operation is a single transaction. In particular, assigning a
//! target reads the counter, writes the assignment, and bumps the counter
//! inside one write transaction; redb serializes write transactions, so two
//! concurrent assignments can never be handed the same worker id.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SERVICE_META).map_err(map_err!(Table))?;
        txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
        txn.open_table(COUNTERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Service registration ───────────────────────────────────────

    /// Register a service type: create its metadata record and an empty
    /// task-assignment record, and initialize the worker-id counter if this
    /// is the first registration ever.
    ///
    /// All three writes land in one transaction. Fails with `AlreadyExists`
    /// if metadata for this service is already present; an existing counter
    /// value is never reset.
    pub fn register_service(&self, meta: &ServiceMeta) -> StateResult<()> {
        let value = serde_json::to_vec(meta).map_err(map_err!(Serialize))?;
        let tasks_value = serde_json::to_vec(&TaskAssignment::empty(&meta.service))
            .map_err(map_err!(Serialize))?;

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut metas = txn.open_table(SERVICE_META).map_err(map_err!(Table))?;
            if metas
                .get(meta.service.as_str())
                .map_err(map_err!(Read))?
                .is_some()
            {
                return Err(StateError::AlreadyExists(meta.service.clone()));
            }
            metas
                .insert(meta.service.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;

            let mut tasks = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
            tasks
                .insert(meta.service.as_str(), tasks_value.as_slice())
                .map_err(map_err!(Write))?;

            let mut counters = txn.open_table(COUNTERS).map_err(map_err!(Table))?;
            let initialized = counters
                .get(WORKER_ID_COUNTER)
                .map_err(map_err!(Read))?
                .is_some();
            if !initialized {
                counters
                    .insert(WORKER_ID_COUNTER, 0u64)
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service = %meta.service, "service registered");
        Ok(())
    }

    /// Get service metadata by name.
    pub fn get_service(&self, service: &str) -> StateResult<Option<ServiceMeta>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICE_META).map_err(map_err!(Table))?;
        match table.get(service).map_err(map_err!(Read))? {
            Some(guard) => {
                let meta: ServiceMeta =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    /// List metadata for all registered service types.
    pub fn list_services(&self) -> StateResult<Vec<ServiceMeta>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICE_META).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let meta: ServiceMeta =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(meta);
        }
        Ok(results)
    }

    /// Remove a service type and its task-assignment record.
    /// Returns true if the service existed. The counter is left untouched.
    pub fn remove_service(&self, service: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut metas = txn.open_table(SERVICE_META).map_err(map_err!(Table))?;
            existed = metas.remove(service).map_err(map_err!(Write))?.is_some();
            let mut tasks = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
            tasks.remove(service).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service, existed, "service removed");
        Ok(existed)
    }

    // ── Target assignment ──────────────────────────────────────────

    /// Assign a target to the next collector worker.
    ///
    /// Reads the counter value `c`, writes the target entry with
    /// `worker_id = c + 1` (overwriting any prior entry for the same id,
    /// last write wins), and moves the counter to `c + 1` — one write
    /// transaction. Fails with `NotFound` if the service is not registered.
    pub fn assign_target(&self, service: &str, target_id: &str) -> StateResult<TargetAssignment> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let assignment;
        {
            let mut tasks = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
            let mut record: TaskAssignment = match tasks.get(service).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StateError::NotFound(service.to_string())),
            };

            let mut counters = txn.open_table(COUNTERS).map_err(map_err!(Table))?;
            let current = counters
                .get(WORKER_ID_COUNTER)
                .map_err(map_err!(Read))?
                .map(|g| g.value())
                .unwrap_or(0);
            let worker_id = current + 1;

            assignment = TargetAssignment {
                target_id: target_id.to_string(),
                worker_id,
                process_id: 0,
            };
            record
                .targets
                .insert(target_id.to_string(), assignment.clone());

            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            tasks
                .insert(service, value.as_slice())
                .map_err(map_err!(Write))?;
            counters
                .insert(WORKER_ID_COUNTER, worker_id)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            service,
            target = target_id,
            worker = assignment.worker_id,
            "target assigned"
        );
        Ok(assignment)
    }

    /// Move an existing target onto a fresh worker id drawn from the counter.
    ///
    /// The previous claim is dropped (`process_id` back to 0). Fails with
    /// `NotFound` if the service or the target is unknown.
    pub fn reassign_target(&self, service: &str, target_id: &str) -> StateResult<TargetAssignment> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let assignment;
        {
            let mut tasks = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
            let mut record: TaskAssignment = match tasks.get(service).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StateError::NotFound(service.to_string())),
            };
            if !record.targets.contains_key(target_id) {
                return Err(StateError::NotFound(format!("{service}/{target_id}")));
            }

            let mut counters = txn.open_table(COUNTERS).map_err(map_err!(Table))?;
            let current = counters
                .get(WORKER_ID_COUNTER)
                .map_err(map_err!(Read))?
                .map(|g| g.value())
                .unwrap_or(0);
            let worker_id = current + 1;

            assignment = TargetAssignment {
                target_id: target_id.to_string(),
                worker_id,
                process_id: 0,
            };
            record
                .targets
                .insert(target_id.to_string(), assignment.clone());

            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            tasks
                .insert(service, value.as_slice())
                .map_err(map_err!(Write))?;
            counters
                .insert(WORKER_ID_COUNTER, worker_id)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            service,
            target = target_id,
            worker = assignment.worker_id,
            "target reassigned"
        );
        Ok(assignment)
    }

    /// Record the collector pid that picked up a target. Does not touch the
    /// worker id or the counter. Fails with `NotFound` if the service or the
    /// target is unknown.
    pub fn claim_target(
        &self,
        service: &str,
        target_id: &str,
        process_id: u32,
    ) -> StateResult<TargetAssignment> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let assignment;
        {
            let mut tasks = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
            let mut record: TaskAssignment = match tasks.get(service).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StateError::NotFound(service.to_string())),
            };
            let Some(entry) = record.targets.get_mut(target_id) else {
                return Err(StateError::NotFound(format!("{service}/{target_id}")));
            };
            entry.process_id = process_id;
            assignment = entry.clone();

            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            tasks
                .insert(service, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service, target = target_id, process_id, "target claimed");
        Ok(assignment)
    }

    /// Remove a target entry. Returns true if it existed.
    /// Fails with `NotFound` if the service is not registered.
    pub fn remove_target(&self, service: &str, target_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut tasks = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
            let mut record: TaskAssignment = match tasks.get(service).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StateError::NotFound(service.to_string())),
            };
            existed = record.targets.remove(target_id).is_some();
            if existed {
                let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
                tasks
                    .insert(service, value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service, target = target_id, existed, "target removed");
        Ok(existed)
    }

    /// Get the task-assignment record for a service type.
    pub fn get_assignments(&self, service: &str) -> StateResult<Option<TaskAssignment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TASK_ASSIGNMENTS).map_err(map_err!(Table))?;
        match table.get(service).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: TaskAssignment =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    // ── Counter ────────────────────────────────────────────────────

    /// Current worker-id counter value (0 if never initialized).
    pub fn worker_counter(&self) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(COUNTERS).map_err(map_err!(Table))?;
        let value = table
            .get(WORKER_ID_COUNTER)
            .map_err(map_err!(Read))?
            .map(|g| g.value())
            .unwrap_or(0);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta(service: &str) -> ServiceMeta {
        ServiceMeta {
            service: service.to_string(),
            db_type: "mongodb".to_string(),
            commands: vec!["serverStatus".to_string(), "replSetGetStatus".to_string()],
            sample_count: 60,
            interval_seconds: 1,
            credentials: Credentials::default(),
        }
    }

    // ── Registration ───────────────────────────────────────────────

    #[test]
    fn register_creates_meta_and_empty_tasks() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();

        let meta = store.get_service("mongodb").unwrap().unwrap();
        assert_eq!(meta.sample_count, 60);
        assert_eq!(meta.commands.len(), 2);

        let tasks = store.get_assignments("mongodb").unwrap().unwrap();
        assert!(tasks.targets.is_empty());
        assert_eq!(store.worker_counter().unwrap(), 0);
    }

    #[test]
    fn register_duplicate_fails() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("redis")).unwrap();

        let err = store.register_service(&test_meta("redis")).unwrap_err();
        assert!(matches!(err, StateError::AlreadyExists(_)));
    }

    #[test]
    fn register_never_resets_counter() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        store.assign_target("mongodb", "127_0_0_1:27017").unwrap();
        assert_eq!(store.worker_counter().unwrap(), 1);

        store.register_service(&test_meta("redis")).unwrap();
        assert_eq!(store.worker_counter().unwrap(), 1);
    }

    #[test]
    fn get_nonexistent_service_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_service("nope").unwrap().is_none());
        assert!(store.get_assignments("nope").unwrap().is_none());
    }

    #[test]
    fn list_services() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        store.register_service(&test_meta("redis")).unwrap();

        let all = store.list_services().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn remove_service_drops_both_records() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        store.assign_target("mongodb", "127_0_0_1:27017").unwrap();

        assert!(store.remove_service("mongodb").unwrap());
        assert!(!store.remove_service("mongodb").unwrap());
        assert!(store.get_service("mongodb").unwrap().is_none());
        assert!(store.get_assignments("mongodb").unwrap().is_none());
        // Counter survives service removal.
        assert_eq!(store.worker_counter().unwrap(), 1);
    }

    // ── Assignment ─────────────────────────────────────────────────

    #[test]
    fn first_assignment_gets_worker_one() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();

        let a = store.assign_target("mongodb", "127_0_0_1:27017").unwrap();
        assert_eq!(a.worker_id, 1);
        assert_eq!(a.process_id, 0);
        assert_eq!(store.worker_counter().unwrap(), 1);
    }

    #[test]
    fn assignments_are_sequential() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();

        let a = store.assign_target("mongodb", "10_0_0_1:27017").unwrap();
        let b = store.assign_target("mongodb", "10_0_0_2:27017").unwrap();
        assert_eq!(a.worker_id, 1);
        assert_eq!(b.worker_id, 2);
        assert_eq!(store.worker_counter().unwrap(), 2);
    }

    #[test]
    fn counter_is_shared_across_services() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        store.register_service(&test_meta("redis")).unwrap();

        let a = store.assign_target("mongodb", "10_0_0_1:27017").unwrap();
        let b = store.assign_target("redis", "10_0_0_1:6379").unwrap();
        assert_eq!(a.worker_id, 1);
        assert_eq!(b.worker_id, 2);
    }

    #[test]
    fn assign_same_target_overwrites() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();

        store.assign_target("mongodb", "127_0_0_1:27017").unwrap();
        let second = store.assign_target("mongodb", "127_0_0_1:27017").unwrap();

        let tasks = store.get_assignments("mongodb").unwrap().unwrap();
        assert_eq!(tasks.targets.len(), 1);
        assert_eq!(tasks.targets["127_0_0_1:27017"], second);
        assert_eq!(second.worker_id, 2);
    }

    #[test]
    fn assign_to_unregistered_service_fails() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.assign_target("nope", "127_0_0_1:27017").unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
    }

    #[test]
    fn concurrent_assignments_get_distinct_worker_ids() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .assign_target("mongodb", &format!("10_0_0_{i}:27017"))
                        .unwrap()
                        .worker_id
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        // No duplicates, no gaps.
        assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
        assert_eq!(store.worker_counter().unwrap(), 8);
    }

    // ── Reassign / claim / remove ──────────────────────────────────

    #[test]
    fn reassign_draws_fresh_worker_id() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        store.assign_target("mongodb", "127_0_0_1:27017").unwrap();
        store.claim_target("mongodb", "127_0_0_1:27017", 4242).unwrap();

        let moved = store.reassign_target("mongodb", "127_0_0_1:27017").unwrap();
        assert_eq!(moved.worker_id, 2);
        assert_eq!(moved.process_id, 0);
        assert_eq!(store.worker_counter().unwrap(), 2);
    }

    #[test]
    fn reassign_unknown_target_fails() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();

        let err = store
            .reassign_target("mongodb", "127_0_0_1:27017")
            .unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
        // A failed reassign must not burn a worker id.
        assert_eq!(store.worker_counter().unwrap(), 0);
    }

    #[test]
    fn claim_sets_only_process_id() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        let before = store.assign_target("mongodb", "127_0_0_1:27017").unwrap();

        let after = store
            .claim_target("mongodb", "127_0_0_1:27017", 31337)
            .unwrap();
        assert_eq!(after.worker_id, before.worker_id);
        assert_eq!(after.process_id, 31337);
        assert_eq!(store.worker_counter().unwrap(), 1);
    }

    #[test]
    fn remove_target() {
        let store = StateStore::open_in_memory().unwrap();
        store.register_service(&test_meta("mongodb")).unwrap();
        store.assign_target("mongodb", "127_0_0_1:27017").unwrap();

        assert!(store.remove_target("mongodb", "127_0_0_1:27017").unwrap());
        assert!(!store.remove_target("mongodb", "127_0_0_1:27017").unwrap());
        let tasks = store.get_assignments("mongodb").unwrap().unwrap();
        assert!(tasks.targets.is_empty());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.register_service(&test_meta("mongodb")).unwrap();
            store.assign_target("mongodb", "127_0_0_1:27017").unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        let tasks = store.get_assignments("mongodb").unwrap().unwrap();
        assert_eq!(tasks.targets["127_0_0_1:27017"].worker_id, 1);
        assert_eq!(store.worker_counter().unwrap(), 1);
    }
}
