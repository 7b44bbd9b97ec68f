//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Protocol conditions raised while reconciling a batch. Each one aborts the
/// rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Account Banned")]
    AccountBanned,

    #[error("Challenge detected: {url}")]
    ChallengeRequired { url: String },

    #[error("Minimum client version={minimum}, running {current}")]
    UnsupportedVersion { minimum: String, current: String },
}

/// Failure reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Low-level error code such as `ECONNRESET`, when known.
    pub code: Option<String>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid credentials. Please fill the user name in the config file.")]
    MissingCredentials,
}

/// Top-level agent failure, classified by `recovery::classify`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid proxy.")]
    InvalidProxy,

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An action call came back with a non-success result code.
    #[error("{action} returned {result}")]
    SoftAction { action: &'static str, result: i32 },
}
