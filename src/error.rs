//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Format Error Enum ==
/// Decode-time failures raised by a serializer.
///
/// These are surfaced to the caller as-is and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Leading bytes do not belong to the serializer's format
    #[error("bytes do not match the expected format")]
    UnknownFormat,

    /// Header ended before the type discriminator was complete
    #[error("truncated header")]
    Truncated,

    /// Type discriminator is not registered in this process
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Discriminator resolved, but to a different type than requested
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Payload rejected by the underlying codec
    #[error("malformed payload: {0}")]
    Malformed(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Stored bytes could not be decoded
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Store instance is stopped or unreachable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Key is empty or too long
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Operation does not apply to the kind of slot stored at the key
    #[error("Wrong type for key '{key}': expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Lifecycle transition not allowed from the current state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Snapshot could not be written or restored
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Filesystem failure while handling snapshots
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Returns true if this is a decode-time format failure.
    pub fn is_format(&self) -> bool {
        matches!(self, CacheError::Format(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
