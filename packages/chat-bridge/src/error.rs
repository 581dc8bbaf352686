//! Error types for the sync bridges.
//!
//! Every failure in this crate is recoverable. Transport, protocol and
//! decode failures end the current poll tick only; configuration failures
//! keep a bridge stopped until it is reconfigured; application failures are
//! handled where player-visible state is mutated and fall back or skip.

use thiserror::Error;

/// Result alias used throughout the bridges.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Coarse failure category, used for logging and for deciding how a caller
/// reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Decode,
    Configuration,
    Application,
}

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Connect, timeout or I/O failure while talking to a remote service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status code.
    #[error("unexpected status {status} from {host}")]
    Status {
        status: reqwest::StatusCode,
        host: String,
    },

    /// The payload did not have the expected shape.
    #[error("malformed payload: {0}")]
    Decode(String),

    /// Missing credentials or a disabled feature.
    #[error("bridge not configured: {0}")]
    Configuration(String),

    /// A player-visible mutation could not be performed.
    #[error("could not apply change: {0}")]
    Application(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Transport(e) if e.is_decode() => ErrorKind::Decode,
            BridgeError::Transport(_) => ErrorKind::Transport,
            BridgeError::Status { .. } => ErrorKind::Protocol,
            BridgeError::Decode(_) => ErrorKind::Decode,
            BridgeError::Configuration(_) => ErrorKind::Configuration,
            BridgeError::Application(_) => ErrorKind::Application,
        }
    }

    /// True for failures that only cost the current tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Protocol | ErrorKind::Decode
        )
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Decode(e.to_string())
    }
}
