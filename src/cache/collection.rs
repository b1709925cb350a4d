//! Keyed Collection Module
//!
//! Typed set semantics on top of a [`Backend`]. Members are compared by their
//! encoded bytes, so adding the same value twice with the same serializer
//! stores it once.

use tracing::trace;

use crate::cache::validate_key;
use crate::error::Result;
use crate::serializer::{Cacheable, Serializer};
use crate::store::Backend;

// == Keyed Collection ==
/// Per-key sets of values.
///
/// A value encoded by one serializer and the same value encoded by another
/// are different members; reading a set with a serializer that did not
/// write all of its members fails with a format error.
#[derive(Debug)]
pub struct KeyedCollection<'a, B: Backend> {
    backend: &'a B,
}

impl<'a, B: Backend> KeyedCollection<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    // == Add ==
    /// Adds `value` to the set at `key`.
    ///
    /// Returns false if an equal member was already present.
    pub fn add<T: Cacheable, S: Serializer>(
        &self,
        key: &str,
        value: &T,
        serializer: &S,
    ) -> Result<bool> {
        validate_key(key)?;
        let member = serializer.encode(value)?;
        let inserted = self.backend.sadd(key.as_bytes(), member)?;
        trace!(key, inserted, format = %serializer.format(), "set add");
        Ok(inserted)
    }

    // == Members ==
    /// Decodes every member of the set at `key`. Absent keys yield an empty set.
    pub fn members<T: Cacheable, S: Serializer>(&self, key: &str, serializer: &S) -> Result<Vec<T>> {
        validate_key(key)?;
        self.backend
            .smembers(key.as_bytes())?
            .iter()
            .map(|bytes| serializer.decode(bytes))
            .collect()
    }

    // == Pop ==
    /// Removes one member and decodes it.
    pub fn pop<T: Cacheable, S: Serializer>(&self, key: &str, serializer: &S) -> Result<Option<T>> {
        validate_key(key)?;
        match self.backend.spop(key.as_bytes())? {
            Some(bytes) => serializer.decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn contains<T: Cacheable, S: Serializer>(
        &self,
        key: &str,
        value: &T,
        serializer: &S,
    ) -> Result<bool> {
        validate_key(key)?;
        let member = serializer.encode(value)?;
        self.backend.sismember(key.as_bytes(), &member)
    }

    /// Removes `value` from the set. Returns true if it was a member.
    pub fn remove<T: Cacheable, S: Serializer>(
        &self,
        key: &str,
        value: &T,
        serializer: &S,
    ) -> Result<bool> {
        validate_key(key)?;
        let member = serializer.encode(value)?;
        self.backend.srem(key.as_bytes(), &member)
    }

    pub fn len(&self, key: &str) -> Result<usize> {
        validate_key(key)?;
        self.backend.scard(key.as_bytes())
    }

    pub fn is_empty(&self, key: &str) -> Result<bool> {
        Ok(self.len(key)? == 0)
    }
}
