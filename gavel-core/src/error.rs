//! Error types for the review engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// Review id absent from registry and store
    #[error("Review not found: {0}")]
    NotFound(String),

    /// FSM rejected an event from the current state
    #[error("Unexpected event {event} in state {state}")]
    UnexpectedEvent { state: String, event: String },

    /// Event directed at a terminal FSM
    #[error("Review is in terminal state {state}")]
    TerminalState { state: String },

    /// Underlying persistence error
    #[error("Storage failure: {0}")]
    Storage(#[from] gavel_db::DbError),

    /// The supervisor could not start a reviewer worker
    #[error("Failed to spawn reviewer: {0}")]
    Spawn(String),

    /// The façade received a request it does not recognize
    #[error("Unknown message type")]
    UnknownMessage,

    /// A reviewer persona exceeded its timeout
    #[error("Reviewer {persona} timed out after {seconds}s")]
    WorkerTimeout { persona: String, seconds: u64 },

    /// State change notification failed
    #[error("Notification error: {0}")]
    Notify(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map a store error at the façade boundary, where a missing row means
    /// the review (or issue) itself is unknown rather than storage failing
    pub(crate) fn from_db(err: gavel_db::DbError) -> Self {
        match err {
            gavel_db::DbError::NotFound(what) => Error::NotFound(what),
            other => Error::Storage(other),
        }
    }

    /// Wire-level error discriminator carried in response envelopes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::UnexpectedEvent { .. } => "unexpected_event_in_state",
            Error::TerminalState { .. } => "terminal_state_violation",
            Error::Storage(_) => "storage_failure",
            Error::Spawn(_) => "spawn_failure",
            Error::UnknownMessage => "unknown_message_type",
            Error::WorkerTimeout { .. } => "worker_timeout",
            Error::Notify(_) => "notify_failure",
            Error::Io(_) => "io_error",
            Error::Json(_) => "serialization_error",
            Error::Config(_) => "config_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_stable() {
        let err = Error::TerminalState {
            state: "approved".to_string(),
        };
        assert_eq!(err.kind(), "terminal_state_violation");

        let err = Error::UnexpectedEvent {
            state: "under_review".to_string(),
            event: "resubmit".to_string(),
        };
        assert_eq!(err.kind(), "unexpected_event_in_state");
        assert!(err.to_string().contains("under_review"));
    }
}
