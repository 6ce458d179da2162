//! Error hierarchy for the connection-serving core.
//!
//! Failures are grouped by the smallest unit they can affect:
//! setup errors stop the process, pool errors reject a submission,
//! connection errors end one session and query errors only change
//! the text sent back to the client.

use std::io;

use config::ConfigError;

use crate::liveness::ConnectionId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading failures (file parse, env overlay)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Socket create/bind/listen failures
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Worker pool failures
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A named service thread (acceptor, sweeper, pool loops) failed to start
    #[error("Failed to spawn thread {name}: {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool has been shut down and no longer accepts tasks
    #[error("Thread pool is terminated")]
    Terminated,

    /// The OS refused to spawn a worker thread
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),
}

/// Reasons a single connection session ends.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Peer closed the connection")]
    PeerClosed,

    #[error("Read failed: {0}")]
    Read(#[source] io::Error),

    /// The liveness entry was evicted (or never existed) while the session was alive
    #[error("Connection {0} is not tracked by the liveness registry")]
    Untracked(ConnectionId),
}

/// Failures reported by the query collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query failure: {0}")]
    Backend(String),
}
