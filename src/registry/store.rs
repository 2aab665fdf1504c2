//! # TaskStore: shared in-memory task table.
//!
//! The store owns the mapping from task id to [`Task`] record behind a single
//! `RwLock`. It is pure data: no timers, no background work. The sweeper and
//! the concurrency gate layer their behavior on top of it through crate-level
//! methods that run inside the same lock.
//!
//! ## Rules
//! - One lock guards the whole table; every mutation happens under the write
//!   guard, so readers never observe a half-applied update.
//! - A lookup miss from `update`/`get` is a value (`None`), not an error —
//!   callers must be able to tell "no such task" apart from a real failure.
//! - Status changes go through the state machine in
//!   [`TaskStatus::can_transition_to`]; a rejected transition leaves the
//!   record untouched.
//! - Nothing here is persisted. All task state is lost on process restart by
//!   design.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;

use crate::error::RegistryError;
use crate::registry::task::{Task, TaskFilter, TaskStatus, TaskUpdate};

/// Shared in-memory table of tracked tasks.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. Handed-out
/// [`Task`] values are snapshots taken under the lock.
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Task>>,
    default_timeout: Duration,
}

impl TaskStore {
    /// Creates an empty store.
    ///
    /// `default_timeout` is applied to tasks created without an explicit
    /// deadline (typically [`Config::task_timeout_clamped`](crate::Config::task_timeout_clamped)).
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            default_timeout,
        }
    }

    /// Inserts a new task in `Pending` status with progress 0.
    ///
    /// `timeout` defaults to the store-wide task timeout when `None`. The
    /// deadline is fixed at creation and never changes afterwards.
    ///
    /// ### Errors
    /// [`RegistryError::AlreadyExists`] if `id` is already held — including
    /// by a terminal task that has not been evicted yet. The existing record
    /// is left unmodified.
    pub async fn create(
        &self,
        id: impl Into<String>,
        kind: impl Into<String>,
        message: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Task, RegistryError> {
        let id = id.into();
        let now = SystemTime::now();
        let task = Task {
            id: id.clone(),
            kind: kind.into(),
            status: TaskStatus::Pending,
            progress: 0,
            message: message.unwrap_or_default(),
            details: HashMap::new(),
            created_at: now,
            updated_at: now,
            timeout: timeout.unwrap_or(self.default_timeout),
        };

        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&id) {
            return Err(RegistryError::AlreadyExists { id });
        }
        tasks.insert(id, task.clone());
        Ok(task)
    }

    /// Applies a mutation to an existing task and returns the updated snapshot.
    ///
    /// Returns `Ok(None)` when `id` is absent — the non-throwing miss. No
    /// entry is created for a missing id.
    ///
    /// Field semantics:
    /// - `status`, when supplied and different from the current status, must
    ///   be a valid state-machine edge; `TimedOut` is reserved for the sweeper
    ///   and rejected here.
    /// - `progress` is clamped to 100 and never checked against the previous
    ///   value.
    /// - `details`, when supplied, replaces the stored map wholesale.
    /// - `updated_at` is refreshed on every applied update.
    ///
    /// ### Errors
    /// [`RegistryError::InvalidTransition`] for any update targeting a task in
    /// a terminal state, or requesting an edge the state machine does not
    /// allow. The record is left untouched in both cases.
    pub async fn update(
        &self,
        id: &str,
        update: TaskUpdate,
    ) -> Result<Option<Task>, RegistryError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(id) else {
            return Ok(None);
        };

        if task.status.is_terminal() {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                from: task.status,
                to: update.status.unwrap_or(task.status),
            });
        }

        if let Some(status) = update.status {
            // Same-status updates (e.g. running -> running progress reports)
            // are refreshes, not transitions.
            if status != task.status {
                let allowed =
                    status != TaskStatus::TimedOut && task.status.can_transition_to(status);
                if !allowed {
                    return Err(RegistryError::InvalidTransition {
                        id: id.to_string(),
                        from: task.status,
                        to: status,
                    });
                }
                task.status = status;
            }
        }
        if let Some(progress) = update.progress {
            task.progress = progress.min(100);
        }
        if let Some(message) = update.message {
            task.message = message;
        }
        if let Some(details) = update.details {
            task.details = details;
        }
        task.updated_at = SystemTime::now();

        Ok(Some(task.clone()))
    }

    /// Returns a snapshot of the task, or `None` if `id` is absent.
    pub async fn get(&self, id: &str) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Returns snapshots of every task matching the filter.
    ///
    /// Supplied filter fields must all match; an empty filter returns every
    /// task. Order is unspecified.
    pub async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Number of tasks currently in `Running` status.
    pub async fn running_count(&self) -> usize {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.status == TaskStatus::Running)
            .count()
    }

    /// Removes every task. Test/reset hook; not part of normal operation.
    pub async fn clear(&self) {
        self.tasks.write().await.clear();
    }

    /// Atomic check-and-start used by the concurrency gate.
    ///
    /// Counting the running tasks and flipping the target to `Running` happen
    /// under one write guard, so two racing callers cannot both claim the
    /// last free slot.
    pub(crate) async fn try_start(&self, id: &str, limit: usize) -> Result<Task, RegistryError> {
        let mut tasks = self.tasks.write().await;

        let running = tasks
            .values()
            .filter(|t| t.status == TaskStatus::Running)
            .count();
        if running >= limit {
            return Err(RegistryError::LimitExceeded { limit });
        }

        let Some(task) = tasks.get_mut(id) else {
            return Err(RegistryError::NotFound { id: id.to_string() });
        };
        if !task.status.can_transition_to(TaskStatus::Running) {
            return Err(RegistryError::InvalidTransition {
                id: id.to_string(),
                from: task.status,
                to: TaskStatus::Running,
            });
        }

        task.status = TaskStatus::Running;
        task.updated_at = SystemTime::now();
        Ok(task.clone())
    }

    /// Snapshot of every task id, taken by the sweeper before mutating.
    pub(crate) async fn ids(&self) -> Vec<String> {
        self.tasks.read().await.keys().cloned().collect()
    }

    /// Marks the task `TimedOut` if it is still non-terminal and past its
    /// deadline at `now`. Returns `true` when a transition happened.
    ///
    /// Re-checks both conditions under the write guard: the task may have
    /// reached a terminal state between the sweeper's snapshot and this call.
    pub(crate) async fn expire(&self, id: &str, now: SystemTime) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(id) else {
            return false;
        };
        if task.status.is_terminal() || !task.is_overdue(now) {
            return false;
        }

        task.status = TaskStatus::TimedOut;
        task.message = format!("task exceeded its {} ms deadline", task.timeout.as_millis());
        task.updated_at = now;
        true
    }

    /// Removes the task if it is terminal and its last update is older than
    /// `retention` at `now`. Returns `true` when evicted.
    pub(crate) async fn evict_if_stale(
        &self,
        id: &str,
        now: SystemTime,
        retention: Duration,
    ) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get(id) else {
            return false;
        };
        let stale = task.status.is_terminal()
            && now
                .duration_since(task.updated_at)
                .map(|age| age > retention)
                .unwrap_or(false);
        if stale {
            tasks.remove(id);
        }
        stale
    }
}
