//! Snapshot Module
//!
//! Point-in-time copy of a keyspace taken when a persistent instance stops.
//! File snapshots are bincode-encoded and written atomically (temp file +
//! rename).

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::Keyspace;

// == Snapshot ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was captured
    pub taken_at: DateTime<Utc>,
    /// Captured slots
    pub entries: Keyspace,
}

impl Snapshot {
    /// Wraps a keyspace taken from a stopping instance.
    pub fn new(entries: Keyspace) -> Self {
        Self {
            taken_at: Utc::now(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Save ==
    /// Writes the snapshot to `path`, replacing any previous file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self).map_err(|e| CacheError::Snapshot(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;

        debug!(
            "Snapshot of {} keys written to {} ({} bytes)",
            self.len(),
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    // == Load ==
    /// Reads a snapshot from `path`. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot = bincode::deserialize(&bytes).map_err(|e| {
            CacheError::Snapshot(format!("corrupt snapshot {}: {}", path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    /// Deletes a snapshot file if present.
    pub fn discard(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Slot;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn keyspace() -> Keyspace {
        let mut entries = Keyspace::new();
        entries.insert(b"scalar".to_vec(), Slot::Scalar(b"bytes".to_vec()));
        entries.insert(
            b"set".to_vec(),
            Slot::Set(BTreeSet::from([b"a".to_vec(), b"b".to_vec()])),
        );
        entries
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.snap");
        let snapshot = Snapshot::new(keyspace());

        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap().unwrap();

        assert_eq!(loaded, snapshot);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dump.snap");

        Snapshot::new(keyspace()).save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Snapshot::load(&dir.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.snap");
        fs::write(&path, b"not a snapshot").unwrap();

        assert!(matches!(Snapshot::load(&path), Err(CacheError::Snapshot(_))));
    }

    #[test]
    fn test_discard() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.snap");
        Snapshot::new(keyspace()).save(&path).unwrap();

        assert!(Snapshot::discard(&path).unwrap());
        assert!(!Snapshot::discard(&path).unwrap());
    }
}
