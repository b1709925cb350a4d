//! Configuration Module
//!
//! Handles loading store and study settings from environment variables.

use std::env;
use std::path::PathBuf;

use crate::store::StoreConfig;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the store instance is addressed by
    pub store_port: u16,
    /// Keep data across a store restart ("save" setting)
    pub persist_on_shutdown: bool,
    /// Snapshot file for persisted data; kept in memory when unset
    pub snapshot_path: Option<PathBuf>,
    /// Single-operation study repetitions
    pub bench_repetitions: usize,
    /// Operations per format in the batched study
    pub bench_batch_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_PORT` - Store port (default: 6379)
    /// - `STORE_SAVE` - Persist on shutdown: true/false/1/0/yes/no/on/off (default: false)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: unset)
    /// - `BENCH_REPETITIONS` - Single-op repetitions (default: 10)
    /// - `BENCH_BATCH_SIZE` - Batched operations per format (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_port: env::var("STORE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.store_port),
            persist_on_shutdown: env::var("STORE_SAVE")
                .ok()
                .and_then(|v| parse_switch(&v))
                .unwrap_or(defaults.persist_on_shutdown),
            snapshot_path: env::var_os("SNAPSHOT_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            bench_repetitions: env::var("BENCH_REPETITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bench_repetitions),
            bench_batch_size: env::var("BENCH_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bench_batch_size),
        }
    }

    /// Launch settings for the store instance.
    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::new(self.store_port).persist_on_shutdown(self.persist_on_shutdown);
        match &self.snapshot_path {
            Some(path) => config.snapshot_path(path),
            None => config,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_port: 6379,
            persist_on_shutdown: false,
            snapshot_path: None,
            bench_repetitions: 10,
            bench_batch_size: 10_000,
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
