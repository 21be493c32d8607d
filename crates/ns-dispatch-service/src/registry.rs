use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// States a registered worker can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Registered but has not yet sent its first heartbeat.
    Registering,
    /// Available to be handed a batch.
    Idle,
    /// Currently running a batch.
    Busy,
    /// Missed its heartbeat deadline or explicitly unregistered.
    Disconnected,
}

struct WorkerRecord {
    state: WorkerState,
    last_heartbeat: Instant,
}

/// Tracks worker presence and the `REGISTERING → IDLE ↔ BUSY → DISCONNECTED`
/// state machine. Bookkeeping only — `/batches` requests are served
/// directly by the service's own dispatcher regardless of which workers
/// are currently `Idle`; this registry does not itself schedule a batch
/// across individual workers.
pub struct WorkerRegistry {
    workers: Mutex<HashMap<String, WorkerRecord>>,
    next_id: Mutex<u64>,
}

impl WorkerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Register a new worker, returning its assigned id.
    pub fn register(&self) -> String {
        let mut next_id = self.next_id.lock().expect("registry lock poisoned");
        let id = format!("worker-{next_id}");
        *next_id += 1;
        drop(next_id);

        self.workers.lock().expect("registry lock poisoned").insert(
            id.clone(),
            WorkerRecord {
                state: WorkerState::Registering,
                last_heartbeat: Instant::now(),
            },
        );
        id
    }

    /// Record a heartbeat, transitioning `Registering`/`Disconnected` to
    /// `Idle`. Returns `false` if the worker id is unknown.
    pub fn heartbeat(&self, id: &str) -> bool {
        let mut workers = self.workers.lock().expect("registry lock poisoned");
        match workers.get_mut(id) {
            Some(record) => {
                record.last_heartbeat = Instant::now();
                if record.state != WorkerState::Busy {
                    record.state = WorkerState::Idle;
                }
                true
            }
            None => false,
        }
    }

    /// Explicitly disconnect a worker. Returns `false` if unknown.
    pub fn unregister(&self, id: &str) -> bool {
        let mut workers = self.workers.lock().expect("registry lock poisoned");
        match workers.get_mut(id) {
            Some(record) => {
                record.state = WorkerState::Disconnected;
                true
            }
            None => false,
        }
    }

    /// Current state of a worker, if known.
    pub fn state_of(&self, id: &str) -> Option<WorkerState> {
        self.workers
            .lock()
            .expect("registry lock poisoned")
            .get(id)
            .map(|r| r.state)
    }

    /// Disconnect every worker whose last heartbeat is older than `max_age`.
    pub fn reap_stale(&self, max_age: Duration) {
        let now = Instant::now();
        let mut workers = self.workers.lock().expect("registry lock poisoned");
        for record in workers.values_mut() {
            if record.state != WorkerState::Disconnected && now.duration_since(record.last_heartbeat) > max_age {
                record.state = WorkerState::Disconnected;
            }
        }
    }

    /// Number of workers currently `Idle` or `Busy`.
    pub fn connected_count(&self) -> usize {
        self.workers
            .lock()
            .expect("registry lock poisoned")
            .values()
            .filter(|r| r.state != WorkerState::Disconnected)
            .count()
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_heartbeat_transitions_to_idle() {
        let registry = WorkerRegistry::new();
        let id = registry.register();
        assert_eq!(registry.state_of(&id), Some(WorkerState::Registering));
        assert!(registry.heartbeat(&id));
        assert_eq!(registry.state_of(&id), Some(WorkerState::Idle));
    }

    #[test]
    fn unregister_marks_disconnected() {
        let registry = WorkerRegistry::new();
        let id = registry.register();
        assert!(registry.unregister(&id));
        assert_eq!(registry.state_of(&id), Some(WorkerState::Disconnected));
    }

    #[test]
    fn unknown_worker_operations_fail() {
        let registry = WorkerRegistry::new();
        assert!(!registry.heartbeat("nope"));
        assert!(!registry.unregister("nope"));
        assert_eq!(registry.state_of("nope"), None);
    }

    #[test]
    fn reap_stale_disconnects_old_heartbeats() {
        let registry = WorkerRegistry::new();
        let id = registry.register();
        registry.heartbeat(&id);
        registry.reap_stale(Duration::from_secs(0));
        assert_eq!(registry.state_of(&id), Some(WorkerState::Disconnected));
    }
}
