//! Slot Module
//!
//! Raw values held by the store, one slot per key.

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Full contents of a store instance, keyed by byte string.
pub type Keyspace = HashMap<Vec<u8>, Slot>;

// == Slot ==
/// Bytes stored under one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    /// Single value, overwritten on every write
    Scalar(Vec<u8>),
    /// Members unique by byte equality, ordered by byte value
    Set(BTreeSet<Vec<u8>>),
    /// Values pushed and popped at the front
    List(VecDeque<Vec<u8>>),
}

impl Slot {
    pub fn kind(&self) -> SlotKind {
        match self {
            Slot::Scalar(_) => SlotKind::Scalar,
            Slot::Set(_) => SlotKind::Set,
            Slot::List(_) => SlotKind::List,
        }
    }

    /// Number of stored byte strings (1 for a scalar).
    pub fn len(&self) -> usize {
        match self {
            Slot::Scalar(_) => 1,
            Slot::Set(members) => members.len(),
            Slot::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Slot Kind ==
/// The shape of a slot, used to reject mismatched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Scalar,
    Set,
    List,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Scalar => "scalar",
            SlotKind::Set => "set",
            SlotKind::List => "list",
        }
    }
}
