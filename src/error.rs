//! Error types for the reading list.

use thiserror::Error;

/// Errors surfaced by list operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input rejected before anything changed
    #[error("Validation error: {field} {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    /// No record with this id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisting the collection failed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn title_required() -> Self {
        EngineError::Validation {
            field: "title",
            reason: "is required",
        }
    }

    pub(crate) fn rating_out_of_range() -> Self {
        EngineError::Validation {
            field: "rating",
            reason: "must be between 1 and 5",
        }
    }
}

/// Errors from a key-value blob store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from one metadata provider call. Never leaves the enricher.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("decode: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
