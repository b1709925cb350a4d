//! Store Module
//!
//! In-process stand-in for an external key/byte-array store: a lifecycle
//! managed [`StoreInstance`] and the [`Connection`]s that talk to it.

mod backend;
mod connection;
mod instance;
mod slot;
mod snapshot;

pub use backend::Backend;
pub use connection::Connection;
pub use instance::{InstanceState, StoreConfig, StoreInstance, VolatilityPolicy};
pub use slot::{Keyspace, Slot, SlotKind};
pub use snapshot::Snapshot;
