//! Error types for statecraft-journal

use statecraft_core::MutationError;
use thiserror::Error;

/// Journal error type
#[derive(Debug, Error)]
pub enum Error {
    /// Position past the end of the history
    #[error("Position {position} out of range (history has {len} records)")]
    PositionOutOfRange { position: usize, len: usize },

    /// A diff could not be replayed onto the current state
    #[error("Replay error at record {record}: {source}")]
    Replay {
        record: usize,
        #[source]
        source: MutationError,
    },

    /// Export error
    #[error("Export error: {0}")]
    ExportError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, Error>;
