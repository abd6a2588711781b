//! Error taxonomy for task runs.
//!
//! - `TaskError`: what `run()` hands back to the caller.
//! - `ProtocolViolation`: the engine broke its contract (fatal to the run).
//! - `StartupError`: the engine refused to start; delivered as `failure.startup`, never returned.

use thiserror::Error;

use crate::domain::events::EventKind;

/// Boxed error an observer may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("cannot run more than one task per builder")]
    AlreadyRunning,

    #[error("engine protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    #[error("observer for `{kind}` failed")]
    Observer {
        kind: EventKind,
        #[source]
        source: BoxError,
    },
}

impl TaskError {
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, TaskError::Protocol(_))
    }
}

#[derive(Debug, Error)]
pub enum ProtocolViolation {
    #[error("engine returned no event while the task was still running")]
    MissingEvent,

    #[error("engine produced a malformed event")]
    MalformedEvent(#[source] serde_json::Error),

    #[error("event `{key}` is missing a documented field")]
    MissingField {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The engine could not start the task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task startup failed: {reason}")]
pub struct StartupError {
    pub reason: String,
}

impl StartupError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
