//! Error types used by the registry and the remote-call retry layer.
//!
//! This module defines two main error enums:
//!
//! - [`RegistryError`] — errors raised by registry operations (creation
//!   collisions, concurrency-limit rejections, invalid status transitions).
//! - [`RemoteError`] — classified failures of remote operations, split into
//!   retryable (transient) and fatal (permanent) conditions.
//!
//! Both types provide `as_label` helpers for logging/metrics, and
//! [`RemoteError`] additionally provides [`RemoteError::is_retryable`], which
//! the retry engine consults before scheduling another attempt.

use thiserror::Error;

use crate::registry::TaskStatus;

/// # Errors produced by registry operations.
///
/// These are synchronous rejections surfaced directly to the caller; none of
/// them mutate the store. A lookup miss on `update`/`get` is **not** an error —
/// it is reported as `Option::None` so callers can distinguish "no such task"
/// from a real failure.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A task with the same id is already held (terminal or not).
    #[error("task {id:?} already exists")]
    AlreadyExists {
        /// The colliding task id.
        id: String,
    },

    /// The configured ceiling on simultaneously running tasks was reached.
    #[error("running-task limit of {limit} reached")]
    LimitExceeded {
        /// The configured `max_concurrent` value.
        limit: usize,
    },

    /// The requested status change is not a valid edge of the task state
    /// machine (e.g. leaving a terminal state).
    #[error("invalid transition {from:?} -> {to:?} for task {id:?}")]
    InvalidTransition {
        /// The task id the transition was attempted on.
        id: String,
        /// Current status of the task.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// `try_start` named a task that is not in the store.
    #[error("task {id:?} not found")]
    NotFound {
        /// The missing task id.
        id: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskreg::RegistryError;
    ///
    /// let err = RegistryError::LimitExceeded { limit: 10 };
    /// assert_eq!(err.as_label(), "task_limit_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::AlreadyExists { .. } => "task_already_exists",
            RegistryError::LimitExceeded { .. } => "task_limit_exceeded",
            RegistryError::InvalidTransition { .. } => "task_invalid_transition",
            RegistryError::NotFound { .. } => "task_not_found",
        }
    }
}

/// # Classified failures of remote operations.
///
/// Each variant is either transient (worth retrying) or permanent (retrying
/// cannot help). The retry engine never converts one variant into another:
/// whatever failure the final attempt observed is what the caller receives.
///
/// Unclassifiable failures land in [`RemoteError::Other`], which is **not**
/// retryable — unknown errors fail closed so programming mistakes are not
/// masked as transient flakiness.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport-level timeout waiting for the remote service.
    #[error("request timed out")]
    Timeout,

    /// The remote service asked us to slow down (HTTP 429 equivalent).
    #[error("rate limited by remote service")]
    RateLimited,

    /// The remote service reported an internal failure (5xx equivalent).
    #[error("remote server error (status {status})")]
    Server {
        /// The HTTP-like status code reported.
        status: u16,
    },

    /// Could not reach the remote service at all.
    #[error("connection failed: {message}")]
    Connection {
        /// Underlying transport error message.
        message: String,
    },

    /// The request was malformed or failed validation (HTTP 400 equivalent).
    #[error("validation failed: {message}")]
    Validation {
        /// What the remote service objected to.
        message: String,
    },

    /// Authentication or authorization was rejected (HTTP 401/403 equivalent).
    #[error("authentication rejected (status {status})")]
    Auth {
        /// The HTTP-like status code reported (401 or 403).
        status: u16,
    },

    /// The addressed remote resource does not exist (HTTP 404 equivalent).
    #[error("remote resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// Anything that could not be classified. Never retried.
    #[error("unclassified remote error: {message}")]
    Other {
        /// The raw error message.
        message: String,
    },
}

impl RemoteError {
    /// Indicates whether the failure is transient and safe to retry.
    ///
    /// Returns `true` for [`RemoteError::Timeout`], [`RemoteError::RateLimited`],
    /// [`RemoteError::Server`], and [`RemoteError::Connection`]; `false` for
    /// everything else, including [`RemoteError::Other`].
    ///
    /// # Example
    /// ```
    /// use taskreg::RemoteError;
    ///
    /// assert!(RemoteError::Timeout.is_retryable());
    /// assert!(RemoteError::Server { status: 503 }.is_retryable());
    /// assert!(!RemoteError::Validation { message: "bad field".into() }.is_retryable());
    /// assert!(!RemoteError::Other { message: "???".into() }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Timeout
                | RemoteError::RateLimited
                | RemoteError::Server { .. }
                | RemoteError::Connection { .. }
        )
    }

    /// Classifies an HTTP-like status code into a [`RemoteError`].
    ///
    /// Mapping:
    /// - `408` → [`RemoteError::Timeout`]
    /// - `429` → [`RemoteError::RateLimited`]
    /// - `500..=599` → [`RemoteError::Server`]
    /// - `400` → [`RemoteError::Validation`]
    /// - `401 | 403` → [`RemoteError::Auth`]
    /// - `404` → [`RemoteError::NotFound`]
    /// - anything else → [`RemoteError::Other`] (not retryable)
    ///
    /// `message` carries whatever body/context the transport layer extracted.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            408 => RemoteError::Timeout,
            429 => RemoteError::RateLimited,
            500..=599 => RemoteError::Server { status },
            400 => RemoteError::Validation {
                message: message.into(),
            },
            401 | 403 => RemoteError::Auth { status },
            404 => RemoteError::NotFound {
                resource: message.into(),
            },
            _ => RemoteError::Other {
                message: message.into(),
            },
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RemoteError::Timeout => "remote_timeout",
            RemoteError::RateLimited => "remote_rate_limited",
            RemoteError::Server { .. } => "remote_server_error",
            RemoteError::Connection { .. } => "remote_connection_failed",
            RemoteError::Validation { .. } => "remote_validation_error",
            RemoteError::Auth { .. } => "remote_auth_error",
            RemoteError::NotFound { .. } => "remote_not_found",
            RemoteError::Other { .. } => "remote_unclassified",
        }
    }
}
