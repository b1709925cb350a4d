//! Connection Module
//!
//! Client handle onto a [`StoreInstance`](crate::store::StoreInstance).
//! A connection outlives restarts of its instance; calls made while the
//! instance is stopped fail with `Unavailable`.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CacheError, Result};
use crate::store::{Backend, Keyspace, Slot, SlotKind};

/// State shared between an instance and its connections.
#[derive(Debug)]
pub(crate) struct ServerState {
    pub(crate) port: u16,
    pub(crate) running: bool,
    pub(crate) keyspace: Keyspace,
}

impl ServerState {
    pub(crate) fn new(port: u16) -> Self {
        Self {
            port,
            running: false,
            keyspace: Keyspace::new(),
        }
    }
}

pub(crate) type SharedState = Arc<RwLock<ServerState>>;

// == Connection ==
#[derive(Debug, Clone)]
pub struct Connection {
    shared: SharedState,
}

impl Connection {
    pub(crate) fn new(shared: SharedState) -> Self {
        Self { shared }
    }

    /// Returns true if the instance is currently serving operations.
    pub fn is_connected(&self) -> bool {
        self.shared.read().running
    }

    fn read<R>(&self, op: impl FnOnce(&Keyspace) -> Result<R>) -> Result<R> {
        let state = self.shared.read();
        if !state.running {
            return Err(refused(state.port));
        }
        op(&state.keyspace)
    }

    fn write<R>(&self, op: impl FnOnce(&mut Keyspace) -> Result<R>) -> Result<R> {
        let mut state = self.shared.write();
        if !state.running {
            return Err(refused(state.port));
        }
        op(&mut state.keyspace)
    }
}

fn refused(port: u16) -> CacheError {
    CacheError::Unavailable(format!("connection refused: no store running on port {}", port))
}

fn wrong_type(key: &[u8], expected: SlotKind, found: SlotKind) -> CacheError {
    CacheError::WrongType {
        key: String::from_utf8_lossy(key).into_owned(),
        expected: expected.as_str(),
        found: found.as_str(),
    }
}

fn set_ref<'a>(keyspace: &'a Keyspace, key: &[u8]) -> Result<Option<&'a BTreeSet<Vec<u8>>>> {
    match keyspace.get(key) {
        None => Ok(None),
        Some(Slot::Set(members)) => Ok(Some(members)),
        Some(other) => Err(wrong_type(key, SlotKind::Set, other.kind())),
    }
}

fn list_ref<'a>(keyspace: &'a Keyspace, key: &[u8]) -> Result<Option<&'a VecDeque<Vec<u8>>>> {
    match keyspace.get(key) {
        None => Ok(None),
        Some(Slot::List(items)) => Ok(Some(items)),
        Some(other) => Err(wrong_type(key, SlotKind::List, other.kind())),
    }
}

/// Runs `op` on the set at `key` and drops the key if the set ends up empty.
fn with_set_mut<R>(
    keyspace: &mut Keyspace,
    key: &[u8],
    op: impl FnOnce(&mut BTreeSet<Vec<u8>>) -> R,
) -> Result<Option<R>> {
    let result = match keyspace.get_mut(key) {
        None => return Ok(None),
        Some(Slot::Set(members)) => op(members),
        Some(other) => return Err(wrong_type(key, SlotKind::Set, other.kind())),
    };
    if keyspace.get(key).is_some_and(Slot::is_empty) {
        keyspace.remove(key);
    }
    Ok(Some(result))
}

impl Backend for Connection {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.read(|keyspace| match keyspace.get(key) {
            None => Ok(None),
            Some(Slot::Scalar(bytes)) => Ok(Some(bytes.clone())),
            Some(other) => Err(wrong_type(key, SlotKind::Scalar, other.kind())),
        })
    }

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.write(|keyspace| {
            keyspace.insert(key.to_vec(), Slot::Scalar(value));
            Ok(())
        })
    }

    fn del(&self, key: &[u8]) -> Result<bool> {
        self.write(|keyspace| Ok(keyspace.remove(key).is_some()))
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        self.read(|keyspace| Ok(keyspace.contains_key(key)))
    }

    fn kind(&self, key: &[u8]) -> Result<Option<SlotKind>> {
        self.read(|keyspace| Ok(keyspace.get(key).map(Slot::kind)))
    }

    fn sadd(&self, key: &[u8], member: Vec<u8>) -> Result<bool> {
        self.write(|keyspace| {
            let slot = keyspace
                .entry(key.to_vec())
                .or_insert_with(|| Slot::Set(BTreeSet::new()));
            match slot {
                Slot::Set(members) => Ok(members.insert(member)),
                other => Err(wrong_type(key, SlotKind::Set, other.kind())),
            }
        })
    }

    fn srem(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.write(|keyspace| {
            Ok(with_set_mut(keyspace, key, |members| members.remove(member))?.unwrap_or(false))
        })
    }

    fn smembers(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.read(|keyspace| {
            Ok(set_ref(keyspace, key)?
                .map(|members| members.iter().cloned().collect())
                .unwrap_or_default())
        })
    }

    fn sismember(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.read(|keyspace| {
            Ok(set_ref(keyspace, key)?.is_some_and(|members| members.contains(member)))
        })
    }

    fn scard(&self, key: &[u8]) -> Result<usize> {
        self.read(|keyspace| Ok(set_ref(keyspace, key)?.map_or(0, BTreeSet::len)))
    }

    fn spop(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.write(|keyspace| Ok(with_set_mut(keyspace, key, BTreeSet::pop_first)?.flatten()))
    }

    fn lpush(&self, key: &[u8], value: Vec<u8>) -> Result<usize> {
        self.write(|keyspace| {
            let slot = keyspace
                .entry(key.to_vec())
                .or_insert_with(|| Slot::List(VecDeque::new()));
            match slot {
                Slot::List(items) => {
                    items.push_front(value);
                    Ok(items.len())
                }
                other => Err(wrong_type(key, SlotKind::List, other.kind())),
            }
        })
    }

    fn lpop(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.write(|keyspace| {
            let popped = match keyspace.get_mut(key) {
                None => return Ok(None),
                Some(Slot::List(items)) => items.pop_front(),
                Some(other) => return Err(wrong_type(key, SlotKind::List, other.kind())),
            };
            if keyspace.get(key).is_some_and(Slot::is_empty) {
                keyspace.remove(key);
            }
            Ok(popped)
        })
    }

    fn llen(&self, key: &[u8]) -> Result<usize> {
        self.read(|keyspace| Ok(list_ref(keyspace, key)?.map_or(0, VecDeque::len)))
    }

    fn dbsize(&self) -> Result<usize> {
        self.read(|keyspace| Ok(keyspace.len()))
    }

    fn flushall(&self) -> Result<()> {
        self.write(|keyspace| {
            keyspace.clear();
            Ok(())
        })
    }
}
