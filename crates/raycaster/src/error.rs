//! Session error types.

use std::io;
use std::path::PathBuf;

use raycaster_networking::NetError;
use thiserror::Error;

/// Errors that stop a session from starting.
///
/// Once a session runs, nothing is fatal: network trouble is logged and
/// counted, never returned.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Socket setup or peer resolution failed.
    #[error(transparent)]
    Network(#[from] NetError),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration parsed but cannot run a session.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// A socket option could not be applied.
    #[error("failed to configure socket: {0}")]
    Socket(#[source] io::Error),

    /// A background task thread could not be started.
    #[error("failed to spawn {task} task: {source}")]
    Spawn {
        /// Which task.
        task: &'static str,
        /// Underlying error.
        source: io::Error,
    },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
