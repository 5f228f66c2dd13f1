//! Error types for herd-core

use std::path::PathBuf;

use thiserror::Error;

use crate::probe::Role;

/// Core error type for herd operations.
///
/// A lock released by a non-owner is deliberately absent: that is a
/// programming error and aborts the process instead of surfacing here.
#[derive(Debug, Error)]
pub enum Error {
    /// Shared-memory block could not be opened or created. Fatal at
    /// startup; "does not exist yet" is handled inside the open path and
    /// never reaches callers.
    #[error("failed to map shared block '{name}': {source}")]
    ResourceInit {
        name: String,
        #[source]
        source: shared_memory::ShmemError,
    },

    /// An existing block is smaller than the layout every participant
    /// agreed on. Usually a schema change without a name change.
    #[error("shared block '{name}' is {actual} bytes, need at least {required}")]
    BlockTooSmall {
        name: String,
        actual: usize,
        required: usize,
    },

    /// Worker subprocess could not be started. Main logs this and retries
    /// on its next spawn cycle.
    #[error("failed to spawn {role} worker: {source}")]
    Spawn {
        role: Role,
        #[source]
        source: std::io::Error,
    },

    /// Journal file could not be appended to.
    #[error("failed to append to journal at {path}: {source}")]
    Journal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration values failed validation.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

/// Result type alias for herd-core operations
pub type Result<T> = std::result::Result<T, Error>;
