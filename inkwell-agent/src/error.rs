//! Typed errors for backend calls.

use thiserror::Error;

/// Errors produced while opening or consuming a backend stream.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The backend process could not be started.
    #[error("failed to start agent backend `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the backend failed.
    #[error("I/O error talking to agent backend: {0}")]
    Io(#[from] std::io::Error),

    /// The backend reported a failure (non-zero exit, auth, network).
    #[error("{message}")]
    Backend { message: String },

    /// A stream line could not be decoded.
    #[error("malformed stream line: {0}")]
    Protocol(String),

    /// The call was aborted locally.
    #[error("request cancelled")]
    Cancelled,

    /// The backend configuration is unusable (e.g. empty CLI command).
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl AgentError {
    pub fn backend(message: impl Into<String>) -> Self {
        AgentError::Backend {
            message: message.into(),
        }
    }
}
