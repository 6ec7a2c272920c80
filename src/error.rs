//! Error types for the game engines and their external collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Logic faults raised by the engines.
///
/// The clamp and wrap contracts keep every engine-generated query in
/// bounds, so these signal a programming error rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A tile query fell outside the grid.
    #[error("position ({x}, {y}) is outside the {side}x{side} grid")]
    OutOfBounds {
        /// Column that was queried.
        x: i32,
        /// Row that was queried.
        y: i32,
        /// Side length of the grid.
        side: i32,
    },
    /// The session was built from values its config validation rejects.
    #[error("{0}")]
    InvalidConfig(String),
}

impl From<ConfigError> for GameError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}

/// Failures of the key-value persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The key cannot be mapped onto the backing storage.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),
}

/// Failures of a notification sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The receiving side of the sink has gone away.
    #[error("notification receiver disconnected")]
    Disconnected,
    /// Writing the message failed.
    #[error("notification I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`crate::config::GameConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The values parsed but describe an unplayable game.
    #[error("invalid config: {0}")]
    Invalid(String),
}
