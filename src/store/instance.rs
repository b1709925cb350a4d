//! Store Instance Module
//!
//! Lifecycle of one in-process store: `Stopped -> Running -> Stopped -> ...`.
//! Whether data survives a `stop()`/`start()` cycle is decided by the
//! instance's [`VolatilityPolicy`].

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::store::connection::{ServerState, SharedState};
use crate::store::{Connection, Keyspace, Snapshot};

// == Volatility Policy ==
/// Decides whether data outlives a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityPolicy {
    /// Everything is discarded on stop ("save" disabled)
    Volatile,
    /// A snapshot is taken on stop and restored on start
    Persistent,
}

impl VolatilityPolicy {
    pub fn from_save_setting(persist_on_shutdown: bool) -> Self {
        if persist_on_shutdown {
            VolatilityPolicy::Persistent
        } else {
            VolatilityPolicy::Volatile
        }
    }

    pub fn persists(&self) -> bool {
        matches!(self, VolatilityPolicy::Persistent)
    }
}

// == Store Config ==
/// Launch settings for a [`StoreInstance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Port the instance is addressed by
    pub port: u16,
    /// Keep data across `stop()`/`start()`
    pub persist_on_shutdown: bool,
    /// Where persisted snapshots go; held in memory when unset
    pub snapshot_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Volatile instance on `port`.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            persist_on_shutdown: false,
            snapshot_path: None,
        }
    }

    pub fn persist_on_shutdown(mut self, persist: bool) -> Self {
        self.persist_on_shutdown = persist;
        self
    }

    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn policy(&self) -> VolatilityPolicy {
        VolatilityPolicy::from_save_setting(self.persist_on_shutdown)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(6379)
    }
}

// == Instance State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Running,
    Stopped,
}

// == Store Instance ==
/// An in-process store serving [`Connection`]s.
///
/// Acquired with [`StoreInstance::launch`] and stopped when dropped, so the
/// instance is released on every exit path. `stop` and `start` take
/// `&mut self` and the state write lock, so no operation runs during a
/// transition.
#[derive(Debug)]
pub struct StoreInstance {
    config: StoreConfig,
    shared: SharedState,
    /// In-memory snapshot for persistent instances without a snapshot path
    retained: Option<Snapshot>,
}

impl StoreInstance {
    // == Launch ==
    /// Creates an instance and starts it.
    pub fn launch(config: StoreConfig) -> Result<Self> {
        let shared = Arc::new(RwLock::new(ServerState::new(config.port)));
        let mut instance = Self {
            config,
            shared,
            retained: None,
        };
        instance.start()?;
        Ok(instance)
    }

    // == Start ==
    /// Starts a stopped instance.
    ///
    /// A persistent instance restores its last snapshot; a volatile one
    /// starts empty.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(CacheError::InvalidTransition(format!(
                "store on port {} is already running",
                self.config.port
            )));
        }

        let keyspace = match self.config.policy() {
            VolatilityPolicy::Persistent => self.restore_snapshot()?,
            VolatilityPolicy::Volatile => {
                if let Some(path) = &self.config.snapshot_path {
                    if Snapshot::discard(path)? {
                        debug!("Removed stale snapshot {}", path.display());
                    }
                }
                Keyspace::new()
            }
        };

        let restored = keyspace.len();
        {
            let mut state = self.shared.write();
            state.keyspace = keyspace;
            state.running = true;
        }

        info!(
            "Store started on port {} (policy={:?}, restored_keys={})",
            self.config.port,
            self.config.policy(),
            restored
        );
        Ok(())
    }

    // == Stop ==
    /// Stops the instance. Stopping an already stopped instance does nothing.
    pub fn stop(&mut self) -> Result<()> {
        let keyspace = {
            let mut state = self.shared.write();
            if !state.running {
                debug!("Store on port {} already stopped", self.config.port);
                return Ok(());
            }
            state.running = false;
            std::mem::take(&mut state.keyspace)
        };

        let count = keyspace.len();
        if !self.config.policy().persists() {
            info!(
                "Store stopped on port {}, discarded {} keys",
                self.config.port, count
            );
            return Ok(());
        }

        let snapshot = Snapshot::new(keyspace);
        if let Some(path) = &self.config.snapshot_path {
            if let Err(e) = snapshot.save(path) {
                warn!(
                    "Snapshot write to {} failed, keeping it in memory: {}",
                    path.display(),
                    e
                );
                self.retained = Some(snapshot);
                return Err(e);
            }
        } else {
            self.retained = Some(snapshot);
        }

        info!(
            "Store stopped on port {}, persisted {} keys",
            self.config.port, count
        );
        Ok(())
    }

    // == Restart ==
    /// Simulates a crash/restart cycle.
    pub fn restart(&mut self) -> Result<()> {
        self.stop()?;
        self.start()
    }

    // == Connect ==
    /// Opens a connection. Fails if the instance is stopped.
    pub fn connect(&self) -> Result<Connection> {
        if !self.is_running() {
            return Err(CacheError::Unavailable(format!(
                "connection refused: no store running on port {}",
                self.config.port
            )));
        }
        Ok(Connection::new(Arc::clone(&self.shared)))
    }

    pub fn state(&self) -> InstanceState {
        if self.is_running() {
            InstanceState::Running
        } else {
            InstanceState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.read().running
    }

    pub fn policy(&self) -> VolatilityPolicy {
        self.config.policy()
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    fn restore_snapshot(&mut self) -> Result<Keyspace> {
        if let Some(snapshot) = self.retained.take() {
            debug!(
                "Restoring in-memory snapshot taken at {}",
                snapshot.taken_at.to_rfc3339()
            );
            return Ok(snapshot.entries);
        }

        if let Some(path) = &self.config.snapshot_path {
            if let Some(snapshot) = Snapshot::load(path)? {
                debug!(
                    "Restoring snapshot {} taken at {}",
                    path.display(),
                    snapshot.taken_at.to_rfc3339()
                );
                return Ok(snapshot.entries);
            }
        }

        Ok(Keyspace::new())
    }
}

impl Drop for StoreInstance {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Store on port {} did not stop cleanly: {}", self.config.port, e);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Backend;
    use tempfile::TempDir;

    #[test]
    fn test_policy_from_save_setting() {
        assert_eq!(
            VolatilityPolicy::from_save_setting(false),
            VolatilityPolicy::Volatile
        );
        assert!(VolatilityPolicy::from_save_setting(true).persists());
        assert_eq!(StoreConfig::default().policy(), VolatilityPolicy::Volatile);
    }

    #[test]
    fn test_launch_starts_running() {
        let instance = StoreInstance::launch(StoreConfig::new(7001)).unwrap();
        assert_eq!(instance.state(), InstanceState::Running);
        assert_eq!(instance.port(), 7001);
    }

    #[test]
    fn test_start_while_running_is_rejected() {
        let mut instance = StoreInstance::launch(StoreConfig::new(7002)).unwrap();
        assert!(matches!(
            instance.start(),
            Err(CacheError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_stop_twice_is_noop() {
        let mut instance = StoreInstance::launch(StoreConfig::new(7003)).unwrap();
        instance.stop().unwrap();
        instance.stop().unwrap();
        assert_eq!(instance.state(), InstanceState::Stopped);
    }

    #[test]
    fn test_connect_refused_when_stopped() {
        let mut instance = StoreInstance::launch(StoreConfig::new(7004)).unwrap();
        instance.stop().unwrap();
        assert!(matches!(instance.connect(), Err(CacheError::Unavailable(_))));
    }

    #[test]
    fn test_volatile_restart_clears_data() {
        let mut instance = StoreInstance::launch(StoreConfig::new(7005)).unwrap();
        let conn = instance.connect().unwrap();
        conn.sadd(b"key", b"value".to_vec()).unwrap();

        instance.restart().unwrap();

        assert!(conn.smembers(b"key").unwrap().is_empty());
        assert_eq!(conn.dbsize().unwrap(), 0);
    }

    #[test]
    fn test_persistent_restart_keeps_data() {
        let config = StoreConfig::new(7006).persist_on_shutdown(true);
        let mut instance = StoreInstance::launch(config).unwrap();
        let conn = instance.connect().unwrap();
        conn.sadd(b"key", b"value".to_vec()).unwrap();
        conn.set(b"scalar", b"bytes".to_vec()).unwrap();

        instance.stop().unwrap();
        assert!(matches!(conn.dbsize(), Err(CacheError::Unavailable(_))));
        instance.start().unwrap();

        assert_eq!(conn.smembers(b"key").unwrap(), vec![b"value".to_vec()]);
        assert_eq!(conn.get(b"scalar").unwrap(), Some(b"bytes".to_vec()));
    }

    #[test]
    fn test_persistent_snapshot_file_survives_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.snap");
        let config = StoreConfig::new(7007)
            .persist_on_shutdown(true)
            .snapshot_path(&path);

        {
            let instance = StoreInstance::launch(config.clone()).unwrap();
            instance
                .connect()
                .unwrap()
                .set(b"key", b"value".to_vec())
                .unwrap();
        }
        assert!(path.exists());

        let instance = StoreInstance::launch(config).unwrap();
        let conn = instance.connect().unwrap();
        assert_eq!(conn.get(b"key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_volatile_start_discards_stale_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.snap");
        let mut stale = Keyspace::new();
        stale.insert(b"key".to_vec(), crate::store::Slot::Scalar(b"old".to_vec()));
        Snapshot::new(stale).save(&path).unwrap();

        let instance = StoreInstance::launch(StoreConfig::new(7008).snapshot_path(&path)).unwrap();

        assert!(!path.exists());
        assert_eq!(instance.connect().unwrap().dbsize().unwrap(), 0);
    }

    #[test]
    fn test_drop_stops_instance() {
        let conn = {
            let instance = StoreInstance::launch(StoreConfig::new(7009)).unwrap();
            instance.connect().unwrap()
        };
        assert!(!conn.is_connected());
    }
}
