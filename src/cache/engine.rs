//! Cache Engine Module
//!
//! Typed get/put/remove over a [`Backend`]. The serializer is chosen per call;
//! the engine keeps no serializer state of its own.

use tracing::{debug, warn};

use crate::cache::{validate_key, CacheStats, KeyedCollection, SerializedRecord};
use crate::error::Result;
use crate::serializer::{Cacheable, Serializer};
use crate::store::{Backend, Connection, SlotKind};

// == Cache Engine ==
/// Orchestrates serialization and storage for string keys.
///
/// All data lives in the backend. Writing a key with a different serializer
/// does not re-encode what is already stored, and reading bytes with a
/// serializer of the other format fails with a format error.
#[derive(Debug)]
pub struct CacheEngine<B: Backend = Connection> {
    backend: B,
    stats: CacheStats,
}

impl<B: Backend> CacheEngine<B> {
    // == Constructor ==
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            stats: CacheStats::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Set view over the same backend.
    pub fn collection(&self) -> KeyedCollection<'_, B> {
        KeyedCollection::new(&self.backend)
    }

    // == Put ==
    /// Stores `value` at `key`.
    ///
    /// Scalar and list slots are overwritten. If the key holds a set, the
    /// value is added to it instead.
    pub fn put<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        value: &T,
        serializer: &S,
    ) -> Result<()> {
        validate_key(key)?;

        // Kind check and write are two calls; a single writer per key is assumed.
        if self.backend.kind(key.as_bytes())? == Some(SlotKind::Set) {
            self.collection().add(key, value, serializer)?;
        } else {
            let bytes = serializer.encode(value)?;
            self.backend.set(key.as_bytes(), bytes)?;
        }

        self.stats.record_write();
        Ok(())
    }

    // == Get ==
    /// Reads the scalar at `key`. Absent keys yield `None`.
    pub fn get<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        serializer: &S,
    ) -> Result<Option<T>> {
        validate_key(key)?;

        let Some(bytes) = self.backend.get(key.as_bytes())? else {
            self.stats.record_miss();
            return Ok(None);
        };

        self.stats.record_hit();
        let decoded = serializer.decode(&bytes);
        self.track(key, decoded).map(Some)
    }

    // == Remove ==
    /// Removes `key` whatever it holds. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let removed = self.backend.del(key.as_bytes())?;
        debug!(key, removed, "remove");
        Ok(removed)
    }

    // == Set Operations ==
    /// Adds `value` to the set at `key`. Returns false if already a member.
    pub fn add_member<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        value: &T,
        serializer: &S,
    ) -> Result<bool> {
        let inserted = self.collection().add(key, value, serializer)?;
        self.stats.record_write();
        Ok(inserted)
    }

    pub fn members<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        serializer: &S,
    ) -> Result<Vec<T>> {
        let members = self.collection().members(key, serializer);
        self.track(key, members)
    }

    pub fn pop_member<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        serializer: &S,
    ) -> Result<Option<T>> {
        let popped = self.collection().pop(key, serializer);
        self.track(key, popped)
    }

    // == List Operations ==
    /// Pushes `value` to the front of the list at `key`. Returns the new length.
    pub fn push<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        value: &T,
        serializer: &S,
    ) -> Result<usize> {
        validate_key(key)?;
        let bytes = serializer.encode(value)?;
        let len = self.backend.lpush(key.as_bytes(), bytes)?;
        self.stats.record_write();
        Ok(len)
    }

    /// Pops the front of the list at `key`.
    pub fn pop_front<T: Cacheable, S: Serializer>(
        &mut self,
        key: &str,
        serializer: &S,
    ) -> Result<Option<T>> {
        validate_key(key)?;
        let popped = match self.backend.lpop(key.as_bytes())? {
            Some(bytes) => serializer.decode(&bytes).map(Some),
            None => Ok(None),
        };
        self.track(key, popped)
    }

    // == Inspect ==
    /// Returns the raw bytes of the scalar at `key` without decoding them.
    pub fn inspect(&self, key: &str) -> Result<Option<SerializedRecord>> {
        validate_key(key)?;
        match self.backend.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(SerializedRecord::detect(key, bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of keys in the backend.
    pub fn len(&self) -> Result<usize> {
        self.backend.dbsize()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Counts format errors on their way to the caller.
    fn track<R>(&mut self, key: &str, result: Result<R>) -> Result<R> {
        if let Err(e) = &result {
            if e.is_format() {
                self.stats.record_format_error();
                warn!("Failed to decode value at '{}': {}", key, e);
            }
        }
        result
    }
}
