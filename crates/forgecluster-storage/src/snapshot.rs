//! The per-node snapshot file: the durable record of consensus state plus
//! the full domain state, written atomically after every applied command.
//!
//! Kept as a single file (rather than a state file and a term file) because
//! the two must always advance together - a node that persisted a new term
//! without the state it voted on, or vice versa, could replay into a world
//! its peers never agreed to.

use std::path::{Path, PathBuf};

use forgecluster_kernel::State;
use forgecluster_types::{LogIndex, NodeId, Term};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::atomic::write_atomic;
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub term: Term,
    pub voted_for: Option<NodeId>,
    pub state: State,
    /// The index of the last log entry folded into `state`. `None` means
    /// the whole log (if any) is still unapplied.
    pub last_applied: Option<LogIndex>,
}

/// Reads and writes a node's [`Snapshot`] to a single JSON file.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the snapshot from disk. A missing file is a fresh node and
    /// yields the default snapshot; a file that exists but fails to parse
    /// is treated the same way, after a warning - a corrupt snapshot must
    /// never stop the node from starting, since the command log can
    /// usually replay the state back.
    pub fn load(&self) -> Result<Snapshot, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "corrupt snapshot file, resetting to empty");
                Ok(Snapshot::default())
            }
        }
    }

    /// Persists `snapshot` via write-to-temp-then-rename.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(snapshot).map_err(StorageError::Encode)?;
        write_atomic(&self.path, &json)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgecluster_kernel::Printer;

    #[test]
    fn missing_file_yields_default_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.json"));
        assert_eq!(store.load().unwrap(), Snapshot::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snapshot.json"));

        let snapshot = Snapshot {
            term: Term::new(3),
            voted_for: Some(NodeId::new("node_5001")),
            state: State::new().with_printer(Printer {
                id: "p1".to_string(),
                company: "Prusa".to_string(),
                model: "MK3".to_string(),
            }),
            last_applied: Some(LogIndex::new(0)),
        };
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn corrupt_file_resets_to_default_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, b"{ this is not json").unwrap();

        let store = SnapshotStore::new(path);
        assert_eq!(store.load().unwrap(), Snapshot::default());
    }
}
