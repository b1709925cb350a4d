//! Volatile KV - An in-process key-value cache engine
//!
//! Typed values go through a pluggable serializer into a store instance whose
//! volatility policy decides what survives a restart.

pub mod cache;
pub mod config;
pub mod error;
pub mod serializer;
pub mod store;
pub mod study;

pub use cache::{CacheEngine, KeyedCollection, SerializedRecord};
pub use config::Config;
pub use error::{CacheError, FormatError, Result};
pub use serializer::{
    BinaryFormatSerializer, Cacheable, Serializer, SerializerFormat, TextFormatSerializer,
    TypeRegistry,
};
pub use store::{Backend, Connection, StoreConfig, StoreInstance, VolatilityPolicy};
