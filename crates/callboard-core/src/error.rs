// Error types for event lifecycle operations

use thiserror::Error;
use uuid::Uuid;

use crate::event::EventStatus;

/// Result type alias for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors that can occur while driving an event through its lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested status change is not allowed by the state machine
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: EventStatus, to: EventStatus },

    /// The actor's role does not permit the action
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },

    /// Event does not exist
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    /// A concurrent writer claimed the same version number first
    #[error("version conflict for event {event_id} at version {version}")]
    VersionConflict { event_id: Uuid, version: i32 },

    /// A status string read from storage did not parse
    #[error("unknown event status: {0}")]
    UnknownStatus(String),

    /// Operation requires a scheduled start time
    #[error("event has no start time")]
    MissingStart,

    /// Input rejected before any write happened
    #[error("invalid input: {0}")]
    Validation(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    /// Create a not-authorized error
    pub fn not_authorized(action: &'static str) -> Self {
        LifecycleError::NotAuthorized { action }
    }

    /// True when the error is a version-number race that the caller may retry
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(self, LifecycleError::VersionConflict { .. })
    }
}
