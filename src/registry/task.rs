//! # Task record and status state machine.
//!
//! Defines [`Task`] the record held by the store for one tracked operation,
//! [`TaskStatus`] its lifecycle state machine, and the request types callers
//! use to mutate and query records ([`TaskUpdate`], [`TaskFilter`]).
//!
//! ## State machine
//! ```text
//!            ┌──────────► Cancelled (terminal)
//!            │                ▲
//! Pending ───┼──► Running ────┼──► Completed (terminal)
//!    │       │       │        │
//!    │       │       └────────┴──► Failed    (terminal)
//!    │       │       │
//!    └───────┴───────┴──► TimedOut (terminal, sweeper only)
//! ```
//!
//! ## Rules
//! - Terminal states accept no further transition.
//! - `TimedOut` is reachable only through the sweeper; the public update path
//!   rejects it.
//! - `progress` is caller-reported and never validated against its previous
//!   value (non-monotonic reports are accepted as-is).

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Lifecycle state of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created but not yet started.
    Pending,
    /// Actively executing; counts against the concurrency limit.
    Running,
    /// Finished successfully (terminal).
    Completed,
    /// Finished with a caller-reported failure (terminal).
    Failed,
    /// Cancelled by the caller (terminal).
    ///
    /// Only the recorded status changes; any in-flight remote work is **not**
    /// preempted and may still run to completion on the remote side.
    Cancelled,
    /// Deadline exceeded, assigned by the sweeper (terminal).
    #[serde(rename = "timeout")]
    TimedOut,
}

impl TaskStatus {
    /// Returns `true` for states that accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed
                | TaskStatus::Failed
                | TaskStatus::Cancelled
                | TaskStatus::TimedOut
        )
    }

    /// Returns `true` if `self -> to` is a valid edge of the state machine.
    ///
    /// The `TimedOut` edges (`Pending -> TimedOut`, `Running -> TimedOut`)
    /// are included here but reserved for the sweeper; the store's public
    /// update path filters them out separately.
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Pending, TimedOut)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Running, TimedOut)
        )
    }
}

/// One tracked asynchronous operation.
///
/// Records are created via [`TaskStore::create`](crate::TaskStore::create),
/// mutated only through the store, and evicted by the sweeper once terminal
/// and past the retention window. Cloned copies handed out by `get`/`list`
/// are snapshots; mutating them has no effect on the store.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Caller-supplied unique key.
    pub id: String,
    /// Categorical tag ("backup", "command", "restore", ...). Opaque to the
    /// registry; only used for filtering.
    #[serde(rename = "type")]
    pub kind: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Caller-reported completion percentage, 0–100.
    pub progress: u8,
    /// Human-readable status description, replaced on each update.
    pub message: String,
    /// Opaque metadata, replaced (not merged) on each update that supplies it.
    pub details: HashMap<String, Value>,
    /// Creation time; the task's deadline is measured from here.
    #[serde(rename = "createdAt", serialize_with = "epoch_millis")]
    pub created_at: SystemTime,
    /// Last mutation time; refreshed on every status/progress/message/details
    /// change.
    #[serde(rename = "updatedAt", serialize_with = "epoch_millis")]
    pub updated_at: SystemTime,
    /// Deadline measured from `created_at`. Fixed at creation.
    #[serde(rename = "timeoutMs", serialize_with = "duration_millis")]
    pub timeout: Duration,
}

impl Task {
    /// Returns `true` once `now` is past the task's deadline.
    pub fn is_overdue(&self, now: SystemTime) -> bool {
        now.duration_since(self.created_at)
            .map(|age| age > self.timeout)
            .unwrap_or(false)
    }
}

/// Mutation request for [`TaskStore::update`](crate::TaskStore::update).
///
/// `status` is mandatory; the optional fields are applied only when supplied.
/// `details`, when present, **replaces** the stored map wholesale.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// Requested status. `None` keeps the current status (progress/message
    /// refresh without a transition).
    pub status: Option<TaskStatus>,
    /// New progress value, clamped to 100.
    pub progress: Option<u8>,
    /// New status message.
    pub message: Option<String>,
    /// Replacement metadata map.
    pub details: Option<HashMap<String, Value>>,
}

impl TaskUpdate {
    /// Shorthand for a pure status transition.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Sets the progress field.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the message field.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the replacement details map.
    pub fn with_details(mut self, details: HashMap<String, Value>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Filter for [`TaskStore::list`](crate::TaskStore::list).
///
/// Supplied fields must **all** match (AND semantics); an empty filter
/// matches every task.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Match tasks in this status.
    pub status: Option<TaskStatus>,
    /// Match tasks with this kind tag.
    pub kind: Option<String>,
}

impl TaskFilter {
    /// Returns `true` if `task` satisfies every supplied field.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if task.kind != *kind {
                return false;
            }
        }
        true
    }

    /// Filter by status only.
    pub fn by_status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            kind: None,
        }
    }

    /// Filter by kind only.
    pub fn by_kind(kind: impl Into<String>) -> Self {
        Self {
            status: None,
            kind: Some(kind.into()),
        }
    }

    /// Sets the status field on an existing filter.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}

fn epoch_millis<S: Serializer>(t: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    let ms = t
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64;
    s.serialize_u64(ms)
}

fn duration_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(TaskStatus::TimedOut.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn valid_edges() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(Running.can_transition_to(Cancelled));
        assert!(Running.can_transition_to(TimedOut));
        assert!(Pending.can_transition_to(TimedOut));
    }

    #[test]
    fn invalid_edges() {
        use TaskStatus::*;
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Failed));
        assert!(!Running.can_transition_to(Pending));
        for terminal in [Completed, Failed, Cancelled, TimedOut] {
            for to in [Pending, Running, Completed, Failed, Cancelled, TimedOut] {
                assert!(
                    !terminal.can_transition_to(to),
                    "{terminal:?} -> {to:?} must be rejected"
                );
            }
        }
    }

    #[test]
    fn filter_and_semantics() {
        let task = Task {
            id: "t1".into(),
            kind: "backup".into(),
            status: TaskStatus::Running,
            progress: 50,
            message: String::new(),
            details: HashMap::new(),
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
            timeout: Duration::from_secs(3_600),
        };

        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter::by_kind("backup").matches(&task));
        assert!(TaskFilter::by_status(TaskStatus::Running).matches(&task));
        assert!(TaskFilter::by_kind("backup")
            .with_status(TaskStatus::Running)
            .matches(&task));
        assert!(!TaskFilter::by_kind("restore").matches(&task));
        assert!(!TaskFilter::by_kind("backup")
            .with_status(TaskStatus::Completed)
            .matches(&task));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::TimedOut).unwrap(),
            "\"timeout\""
        );
    }

    #[test]
    fn overdue_check_uses_creation_time() {
        let created = SystemTime::now();
        let task = Task {
            id: "t1".into(),
            kind: "command".into(),
            status: TaskStatus::Pending,
            progress: 0,
            message: String::new(),
            details: HashMap::new(),
            created_at: created,
            updated_at: created,
            timeout: Duration::from_millis(100),
        };
        assert!(!task.is_overdue(created + Duration::from_millis(50)));
        assert!(task.is_overdue(created + Duration::from_millis(150)));
        // Clock moving backwards must not mark anything overdue.
        assert!(!task.is_overdue(created - Duration::from_secs(1)));
    }
}
