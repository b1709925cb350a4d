//! Cache Module
//!
//! Typed cache engine and set collections on top of a store backend.

mod collection;
mod engine;
mod record;
mod stats;


// Re-export public types
pub use collection::KeyedCollection;
pub use engine::CacheEngine;
pub use record::SerializedRecord;
pub use stats::CacheStats;

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Checks that a key is non-empty and within [`MAX_KEY_LENGTH`].
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
