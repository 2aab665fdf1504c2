//! # Task lifecycle registry.
//!
//! This module contains the in-memory registry for long-running operations:
//! - [`task`]: the task record, status state machine, and request types;
//! - [`store`]: the lock-guarded table with create/update/get/list;
//! - [`gate`]: admission control bounding simultaneously running tasks;
//! - [`sweeper`]: the periodic overdue/eviction scan.
//!
//! [`TaskRegistry`] ties the pieces together: one instance is built from
//! [`Config`] at process start and injected into every handler, which keeps
//! tests isolated — there is no process-wide singleton.

mod gate;
mod store;
mod sweeper;
mod task;

pub use gate::ConcurrencyGate;
pub use store::TaskStore;
pub use sweeper::TimeoutSweeper;
pub use task::{Task, TaskFilter, TaskStatus, TaskUpdate};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::RegistryError;

/// Handle to a spawned sweeper loop.
///
/// Dropping the handle does **not** stop the loop; call
/// [`SweeperHandle::shutdown`] (or cancel a clone of the token it was spawned
/// with) so the timer is released deterministically at process shutdown.
pub struct SweeperHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the loop to stop and waits for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        // The loop only awaits the ticker and the token, so this join is
        // bounded by one select round trip; a panic inside the loop is the
        // only way it can fail, and there is nothing to do about it here.
        let _ = self.join.await;
    }
}

/// The registry context object: store, gate, and sweeper wiring in one place.
///
/// Construct once from [`Config`] and hand clones of the inner pieces (or the
/// whole registry behind an `Arc`) to the handlers that need them. Every
/// instance is fully independent, so tests get isolated registries for free.
///
/// The convenience methods below delegate to [`TaskStore`] and
/// [`ConcurrencyGate`]; handlers that only need one piece can grab it via
/// [`TaskRegistry::store`] / [`TaskRegistry::gate`] instead.
///
/// Note on cancellation: marking a task `Cancelled` updates the recorded
/// status only. Remote work already in flight is **not** preempted and may
/// still finish on the remote side.
pub struct TaskRegistry {
    store: Arc<TaskStore>,
    gate: ConcurrencyGate,
    cleanup_interval: Duration,
}

impl TaskRegistry {
    /// Builds a registry from configuration.
    ///
    /// Out-of-range config values are clamped here (see [`Config`] for the
    /// ranges); the rest of the registry assumes pre-clamped inputs.
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(TaskStore::new(config.task_timeout_clamped()));
        let gate = ConcurrencyGate::new(store.clone(), config.max_concurrent_clamped());
        Self {
            store,
            gate,
            cleanup_interval: config.cleanup_interval_clamped(),
        }
    }

    /// The shared task store.
    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// The admission gate.
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Spawns the timeout/eviction sweeper on the current runtime.
    ///
    /// Call at most once per registry; the returned handle stops the loop at
    /// shutdown. Sweeps run every `cleanup_interval`.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        let token = CancellationToken::new();
        let join = TimeoutSweeper::new(self.store.clone(), self.cleanup_interval)
            .spawn(token.clone());
        SweeperHandle { token, join }
    }

    /// See [`TaskStore::create`].
    pub async fn create(
        &self,
        id: impl Into<String>,
        kind: impl Into<String>,
        message: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Task, RegistryError> {
        self.store.create(id, kind, message, timeout).await
    }

    /// See [`TaskStore::update`].
    pub async fn update(
        &self,
        id: &str,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RegistryError> {
        self.store.update(id, update).await
    }

    /// See [`TaskStore::get`].
    pub async fn get(&self, id: &str) -> Option<Task> {
        self.store.get(id).await
    }

    /// See [`TaskStore::list`].
    pub async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.store.list(filter).await
    }

    /// See [`TaskStore::running_count`].
    pub async fn running_count(&self) -> usize {
        self.store.running_count().await
    }

    /// See [`ConcurrencyGate::try_start`].
    pub async fn try_start(&self, id: &str) -> Result<Task, RegistryError> {
        self.gate.try_start(id).await
    }
}
