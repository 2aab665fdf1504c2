//! # taskreg
//!
//! **Taskreg** is an in-memory lifecycle registry for long-running remote
//! operations (backups, commands, restores), paired with a retry/backoff
//! engine for tolerating transient failures of the remote service.
//!
//! Tool handlers create a task under a caller-supplied key, perform the
//! actual work through retry-wrapped remote calls, and report progress back;
//! a background sweeper expires overdue tasks and reclaims stale entries.
//!
//! ## Architecture
//! ```text
//!   handler #1        handler #2        handler #3
//!       │                 │                 │
//!       ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  TaskRegistry (context object, one per process)           │
//! │                                                           │
//! │  ┌─────────────────┐      ┌──────────────────────────┐    │
//! │  │ ConcurrencyGate │─────►│ TaskStore                │    │
//! │  │ try_start(id)   │      │ RwLock<HashMap<id,Task>> │    │
//! │  └─────────────────┘      │ create/update/get/list   │    │
//! │                           └────────────▲─────────────┘    │
//! │                                        │                  │
//! │  ┌──────────────────────┐              │                  │
//! │  │ TimeoutSweeper       │──────────────┘                  │
//! │  │ every cleanup_interval:                                │
//! │  │   overdue → TimedOut; stale terminal → evict           │
//! │  └──────────────────────┘                                 │
//! └───────────────────────────────────────────────────────────┘
//!
//!   handler work ──► retry_with_backoff(op, policy)
//!                        │
//!                        ├─ Ok ──────────► return (no delay)
//!                        └─ Err ─► RemoteError::is_retryable()?
//!                              ├─ fatal ──► return unchanged
//!                              └─ transient ──► sleep(BackoffPolicy) ──► retry
//! ```
//!
//! ## Lifecycle
//! ```text
//! create(id, kind) ──► Pending
//! try_start(id)    ──► Running       (gated by max_concurrent, atomic)
//! update(id, ...)  ──► Completed / Failed / Cancelled   (terminal)
//! sweeper          ──► TimedOut      (terminal, sweeper only)
//! sweeper          ──► eviction once terminal and past retention
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types                              |
//! |-----------------|----------------------------------------------------------|----------------------------------------|
//! | **Registry**    | Track tasks by key with a status state machine.          | [`TaskRegistry`], [`TaskStore`]        |
//! | **Admission**   | Bound simultaneously running tasks.                      | [`ConcurrencyGate`]                    |
//! | **Sweeping**    | Expire overdue tasks, evict stale terminal entries.      | [`TimeoutSweeper`], [`SweeperHandle`]  |
//! | **Retry**       | Re-invoke transient-failing remote calls with backoff.   | [`retry_with_backoff`], [`RetryPolicy`]|
//! | **Errors**      | Typed registry errors and classified remote failures.    | [`RegistryError`], [`RemoteError`]     |
//! | **Configuration** | Centralize limits, timeouts, and retry defaults.       | [`Config`]                             |
//!
//! ## Limitations
//! - Nothing is persisted: all task state is lost on process restart.
//! - Marking a task `Cancelled` changes the recorded status only; in-flight
//!   remote work is not preempted.
//! - Tasks are independent; the registry enforces no ordering between them.
//!
//! ## Example
//! ```rust
//! use taskreg::{Config, RemoteError, TaskRegistry, TaskStatus, TaskUpdate, retry_with_backoff};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = TaskRegistry::new(&Config::default());
//!     let sweeper = registry.spawn_sweeper();
//!
//!     registry.create("backup-vm7", "backup", Some("snapshotting vm7".into()), None).await?;
//!     registry.try_start("backup-vm7").await?;
//!
//!     // The remote call would live here, wrapped in retry_with_backoff:
//!     let result = retry_with_backoff(
//!         || async { Ok::<_, RemoteError>("snapshot-id-1") },
//!         &Config::default().retry,
//!     )
//!     .await?;
//!
//!     registry
//!         .update(
//!             "backup-vm7",
//!             TaskUpdate::status(TaskStatus::Completed)
//!                 .with_progress(100)
//!                 .with_message(format!("created {result}")),
//!         )
//!         .await?;
//!
//!     sweeper.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod registry;
mod retry;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{RegistryError, RemoteError};
pub use registry::{
    ConcurrencyGate, SweeperHandle, Task, TaskFilter, TaskRegistry, TaskStatus, TaskStore,
    TaskUpdate, TimeoutSweeper,
};
pub use retry::{retry_with_backoff, BackoffPolicy, RetryPolicy};
