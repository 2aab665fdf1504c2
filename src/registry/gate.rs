//! # ConcurrencyGate: bound on simultaneously running tasks.
//!
//! The gate is the only way a task moves from `Pending` to `Running`. It
//! enforces the configured ceiling by delegating to the store's atomic
//! check-and-start, which counts running tasks and flips the target status
//! under a single write guard.
//!
//! ## Rules
//! - Check and transition are one critical section: two racing `try_start`
//!   calls can never both claim the last free slot.
//! - A rejected call leaves the task exactly as it was.
//! - The gate bounds how many tasks are **recorded** as running; it does not
//!   schedule or execute anything itself.

use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::registry::store::TaskStore;
use crate::registry::task::Task;

/// Admission gate over a shared [`TaskStore`].
///
/// Cheap to clone; clones share the same store and limit.
#[derive(Clone)]
pub struct ConcurrencyGate {
    store: Arc<TaskStore>,
    limit: usize,
}

impl ConcurrencyGate {
    /// Creates a gate enforcing `limit` over `store`.
    ///
    /// `limit` is expected to be pre-clamped (see
    /// [`Config::max_concurrent_clamped`](crate::Config::max_concurrent_clamped)).
    pub fn new(store: Arc<TaskStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Atomically claims a running slot for the named task.
    ///
    /// On success the task is now `Running` and the returned snapshot
    /// reflects that.
    ///
    /// ### Errors
    /// - [`RegistryError::LimitExceeded`] when every slot is taken; the task
    ///   is left unchanged. Callers typically surface this to the user or
    ///   re-submit later — the gate has no queue.
    /// - [`RegistryError::NotFound`] when `id` was never created.
    /// - [`RegistryError::InvalidTransition`] when the task is not `Pending`
    ///   (already started, or terminal).
    pub async fn try_start(&self, id: &str) -> Result<Task, RegistryError> {
        match self.store.try_start(id, self.limit).await {
            Ok(task) => Ok(task),
            Err(err) => {
                debug!(task = id, reason = err.as_label(), "start rejected");
                Err(err)
            }
        }
    }

    /// The configured running-task ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::registry::task::{TaskStatus, TaskUpdate};

    fn setup(limit: usize) -> (Arc<TaskStore>, ConcurrencyGate) {
        let store = Arc::new(TaskStore::new(Duration::from_secs(3_600)));
        let gate = ConcurrencyGate::new(store.clone(), limit);
        (store, gate)
    }

    #[tokio::test]
    async fn start_transitions_pending_to_running() {
        let (store, gate) = setup(10);
        store.create("t1", "backup", None, None).await.unwrap();

        let task = gate.try_start("t1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(store.running_count().await, 1);
    }

    #[tokio::test]
    async fn rejects_at_capacity_and_leaves_task_unchanged() {
        let (store, gate) = setup(2);
        for i in 0..3 {
            store
                .create(format!("t{i}"), "command", None, None)
                .await
                .unwrap();
        }
        gate.try_start("t0").await.unwrap();
        gate.try_start("t1").await.unwrap();

        let err = gate.try_start("t2").await.unwrap_err();
        assert_eq!(err, RegistryError::LimitExceeded { limit: 2 });
        assert_eq!(
            store.get("t2").await.unwrap().status,
            TaskStatus::Pending,
            "rejected task must keep its status"
        );
        assert_eq!(store.running_count().await, 2);
    }

    #[tokio::test]
    async fn slot_frees_up_when_a_task_finishes() {
        let (store, gate) = setup(1);
        store.create("t1", "backup", None, None).await.unwrap();
        store.create("t2", "backup", None, None).await.unwrap();

        gate.try_start("t1").await.unwrap();
        assert!(gate.try_start("t2").await.is_err());

        store
            .update("t1", TaskUpdate::status(TaskStatus::Completed))
            .await
            .unwrap();
        gate.try_start("t2").await.unwrap();
        assert_eq!(store.running_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_task_is_reported() {
        let (_store, gate) = setup(10);
        let err = gate.try_start("ghost").await.unwrap_err();
        assert_eq!(err, RegistryError::NotFound { id: "ghost".into() });
    }

    #[tokio::test]
    async fn cannot_start_a_task_twice() {
        let (store, gate) = setup(10);
        store.create("t1", "backup", None, None).await.unwrap();
        gate.try_start("t1").await.unwrap();

        let err = gate.try_start("t1").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
        assert_eq!(store.running_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_callers_cannot_overshoot_the_limit() {
        let (store, gate) = setup(1);
        for i in 0..8 {
            store
                .create(format!("t{i}"), "command", None, None)
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(
                async move { gate.try_start(&format!("t{i}")).await },
            ));
        }

        let mut started = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                started += 1;
            }
        }
        assert_eq!(started, 1, "exactly one caller may claim the single slot");
        assert_eq!(store.running_count().await, 1);
    }
}
