//! Error taxonomy shared by the token client and the session controller.
//!
//! `SessionError` is what operations return; `ErrorInfo` is the timestamped
//! record that ends up in `SessionStatus::Failed` and in the error slots that
//! the presentation layer shows (and lets the user dismiss).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of response body bytes kept in a `RemoteRejected` error
pub const MAX_REJECTION_BODY: usize = 512;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The backend could not be reached (DNS, connect, TLS, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status, e.g. 401 for a bad API key
    #[error("backend rejected the request with status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// The backend answered 200 but the body is not what we expect
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// `start()` called on a controller that already left `Idle`
    #[error("session already started (state: {state})")]
    AlreadyStarted { state: String },

    /// The media-session collaborator reported a runtime fault
    #[error("media session error: {0}")]
    Collaborator(String),

    /// Caller-supplied input violates an invariant
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start()` called outside a Tokio runtime, so no driver task can run
    #[error("no async runtime available to drive the session")]
    NoRuntime,
}

/// Tag identifying which kind of failure an `ErrorInfo` records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransportError,
    RemoteRejected,
    MalformedResponse,
    AlreadyStarted,
    CollaboratorError,
    InvalidConfig,
    NoRuntime,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Transport(_) => ErrorKind::TransportError,
            SessionError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            SessionError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            SessionError::AlreadyStarted { .. } => ErrorKind::AlreadyStarted,
            SessionError::Collaborator(_) => ErrorKind::CollaboratorError,
            SessionError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            SessionError::NoRuntime => ErrorKind::NoRuntime,
        }
    }

    /// Wrap an opaque collaborator error, keeping its context chain
    pub fn collaborator(err: &anyhow::Error) -> Self {
        SessionError::Collaborator(format!("{:#}", err))
    }

    pub(crate) fn rejected(status: u16, body: &str) -> Self {
        let body = if body.len() > MAX_REJECTION_BODY {
            let mut end = MAX_REJECTION_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &body[..end])
        } else {
            body.to_string()
        };

        SessionError::RemoteRejected { status, body }
    }
}

/// An observable, timestamped error record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

impl From<&SessionError> for ErrorInfo {
    fn from(err: &SessionError) -> Self {
        ErrorInfo::new(err.kind(), err.to_string())
    }
}

impl From<SessionError> for ErrorInfo {
    fn from(err: SessionError) -> Self {
        ErrorInfo::from(&err)
    }
}
