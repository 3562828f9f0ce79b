//! Error types for the chat session core.
//!
//! Transport and decode failures are not returned as `Err`; they end the
//! current turn with a [`StreamEvent::Failed`](crate::core::decoder::StreamEvent)
//! carrying a [`FailureKind`]. The types here that are returned as `Err`
//! describe misuse of the session (wrong state, bad input) or persistence
//! problems.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::core::engine::TurnState;

/// Errors raised by session operations that are rejected outright.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The role name is not one of `system`, `user` or `assistant`.
    InvalidRole(String),
    /// Temperature outside the accepted `[0.0, 2.0]` range.
    InvalidTemperature(f32),
    /// A turn is in flight; the engine only accepts this in `Idle`.
    Busy(TurnState),
    /// A chat turn was requested before any model was selected.
    NoModelSelected,
    /// `retry` was requested but no prompt is waiting for an answer.
    NothingToRetry,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidRole(role) => write!(f, "invalid message role: {role}"),
            SessionError::InvalidTemperature(value) => {
                write!(f, "temperature {value} is outside 0.0..=2.0")
            }
            SessionError::Busy(state) => {
                write!(f, "a generation is in progress (state: {state})")
            }
            SessionError::NoModelSelected => write!(f, "no model selected"),
            SessionError::NothingToRetry => write!(f, "nothing to retry"),
        }
    }
}

impl StdError for SessionError {}

/// Failures surfaced by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not connect, or the connection dropped mid-body.
    Connection(String),
    /// The network layer gave up waiting.
    Timeout,
    /// The server answered with a non-success HTTP status.
    Status { status: u16, message: String },
    /// The server reported an error inside the stream body.
    Server(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connection(detail) => write!(f, "connection error: {detail}"),
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::Status { status, message } => {
                write!(f, "server returned {status}: {message}")
            }
            TransportError::Server(message) => write!(f, "server error: {message}"),
        }
    }
}

impl StdError for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Why a turn ended with `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Transport(TransportError),
    /// The decoder could not make sense of a complete logical unit.
    MalformedStream(String),
}

impl FailureKind {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureKind::Transport(TransportError::Timeout))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport(err) => err.fmt(f),
            FailureKind::MalformedStream(detail) => write!(f, "malformed stream: {detail}"),
        }
    }
}

impl StdError for FailureKind {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FailureKind::Transport(err) => Some(err),
            FailureKind::MalformedStream(_) => None,
        }
    }
}

impl From<TransportError> for FailureKind {
    fn from(err: TransportError) -> Self {
        FailureKind::Transport(err)
    }
}

/// Errors that can occur when saving or loading a session snapshot.
#[derive(Debug)]
pub enum PersistenceError {
    /// The snapshot declares a schema version this build does not know.
    SchemaMismatch { found: u64 },
    /// The snapshot is not structurally valid.
    Corrupt(String),
    /// Reading or writing the snapshot file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::SchemaMismatch { found } => {
                write!(f, "unsupported session schema version {found}")
            }
            PersistenceError::Corrupt(detail) => write!(f, "corrupt session snapshot: {detail}"),
            PersistenceError::Io { path, source } => {
                write!(f, "session file {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for PersistenceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PersistenceError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_exposes_transport_source() {
        let failure = FailureKind::from(TransportError::Timeout);
        assert!(failure.is_timeout());
        assert!(failure.source().is_some());
        assert_eq!(failure.to_string(), "request timed out");
    }

    #[test]
    fn busy_error_names_the_state() {
        let err = SessionError::Busy(TurnState::Streaming);
        assert_eq!(
            err.to_string(),
            "a generation is in progress (state: streaming)"
        );
    }
}
