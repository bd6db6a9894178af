//! # Terrain Error Types
//!
//! Errors surfaced by configuration loading and runtime tile edits.
//!
//! Generation itself never fails: out-of-range tile access is absorbed by
//! the chunk, and missing neighbours fall back to defaults.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the terrain system.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        /// The file that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration could not be written back out as TOML.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pass appears in a position that breaks a pipeline dependency.
    #[error("pass `{pass}` is out of order: {reason}")]
    PassOrder {
        /// Name of the misplaced pass.
        pass: String,
        /// Which dependency it breaks.
        reason: String,
    },

    /// A runtime edit targeted a chunk that is not in the cache.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(i32),
}

/// Result type for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
