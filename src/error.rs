/// Error types for the album core
///
/// Everything fallible in the crate returns `Result<_, AlbumError>`.
/// Database and serialization errors convert automatically via `#[from]`;
/// callers decide whether to surface or retry (the core never retries).

use thiserror::Error;

/// All errors the album core can produce
#[derive(Debug, Error)]
pub enum AlbumError {
    /// The catalog database rejected or failed an operation
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A JSON column or config file failed to parse/serialize
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file or data directory access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup by filename found no photo
    #[error("photo not found: {0}")]
    PhotoNotFound(String),

    /// Counter rebuild was cancelled between field batches.
    /// Fields committed before the cancel point remain valid.
    #[error("counter rebuild cancelled")]
    RebuildCancelled,
}
