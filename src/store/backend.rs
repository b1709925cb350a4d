//! Backend Trait
//!
//! Raw byte primitives the cache engine needs from a store.

use crate::error::Result;
use crate::store::SlotKind;

/// A key/byte-array store.
///
/// Every call is atomic with respect to its key. Implementations fail with
/// `CacheError::Unavailable` when the underlying store is not running and with
/// `CacheError::WrongType` when the key holds a different kind of slot.
pub trait Backend {
    /// Reads a scalar slot.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Writes a scalar slot, replacing whatever the key held.
    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Removes a key of any kind. Returns true if it existed.
    fn del(&self, key: &[u8]) -> Result<bool>;

    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// Kind of slot stored at `key`, if any.
    fn kind(&self, key: &[u8]) -> Result<Option<SlotKind>>;

    /// Adds a set member. Returns false if it was already present.
    fn sadd(&self, key: &[u8], member: Vec<u8>) -> Result<bool>;

    /// Removes a set member. Returns true if it was present.
    fn srem(&self, key: &[u8], member: &[u8]) -> Result<bool>;

    fn smembers(&self, key: &[u8]) -> Result<Vec<Vec<u8>>>;

    fn sismember(&self, key: &[u8], member: &[u8]) -> Result<bool>;

    fn scard(&self, key: &[u8]) -> Result<usize>;

    /// Removes and returns one member.
    fn spop(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Pushes to the front of a list. Returns the new length.
    fn lpush(&self, key: &[u8], value: Vec<u8>) -> Result<usize>;

    /// Pops from the front of a list.
    fn lpop(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn llen(&self, key: &[u8]) -> Result<usize>;

    /// Number of keys.
    fn dbsize(&self) -> Result<usize>;

    /// Removes every key.
    fn flushall(&self) -> Result<()>;
}
