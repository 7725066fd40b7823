//! Error types for memory operations.

use camino::Utf8PathBuf;

/// Errors returned by the record store and the engine.
///
/// Malformed units found while enumerating the store are not represented
/// here: they are skipped and never reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Rejected input: utility out of range, empty intent, bad session id,
    /// or an out-of-range retrieval/prune parameter.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem failure on a specific path.
    #[error("io error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A fully written temp file could not be published under its final name.
    #[error("failed to publish record: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// No record with the requested id.
    #[error("memory not found: {0}")]
    NotFound(String),
}

impl MemoryError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors the caller caused (as opposed to storage failures).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = MemoryError> = std::result::Result<T, E>;
