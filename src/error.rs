//! Error types.

use std::io;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong when building or feeding a worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The component has begun stopping and no longer takes work.
    #[error("not accepting work")]
    Unavailable,

    /// A [`Config`](crate::Config) value was rejected.
    #[error("config error: {0}")]
    Config(String),

    /// The OS would not start a thread.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] io::Error),
}

impl Error {
    /// Build an [`Error::Config`] from any message.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// True for the error `add` reports once a component stops accepting.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable)
    }
}
