//! The per-node command log: the dense, ordered list of commands a node has
//! accepted (as leader) or replicated (as follower).
//!
//! The whole log is rewritten on every append rather than appended-to
//! in-place. That's wasteful at large scale, but this cluster's log never
//! needs to outgrow what fits comfortably in memory, and rewriting the
//! whole file keeps the same write-to-temp-then-rename atomicity guarantee
//! as the snapshot, with no separate truncation-recovery path to get wrong.

use std::path::PathBuf;

use forgecluster_kernel::Command;
use forgecluster_types::{LogIndex, Term};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::atomic::write_atomic;
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub index: LogIndex,
    pub term: Term,
    pub command: Command,
    pub timestamp: String,
}

/// Reads and writes a node's command log to a single JSON file.
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the full log. A missing or corrupt file yields an empty log -
    /// a corrupt log, like a corrupt snapshot, must never prevent startup.
    pub fn load(&self) -> Result<Vec<LogEntry>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "corrupt log file, resetting to empty");
                Ok(Vec::new())
            }
        }
    }

    /// Rewrites the entire log via write-to-temp-then-rename.
    pub fn save(&self, entries: &[LogEntry]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries).map_err(StorageError::Encode)?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgecluster_kernel::Command;

    fn entry(index: u64) -> LogEntry {
        LogEntry {
            index: LogIndex::new(index),
            term: Term::new(1),
            command: Command::AddPrinter {
                id: format!("p{index}"),
                company: "Prusa".to_string(),
                model: "MK3".to_string(),
            },
            timestamp: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn missing_file_yields_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("log.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("log.json"));

        let entries = vec![entry(0), entry(1), entry(2)];
        store.save(&entries).unwrap();

        assert_eq!(store.load().unwrap(), entries);
    }

    #[test]
    fn corrupt_file_resets_to_empty_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, b"not json at all").unwrap();

        let store = LogStore::new(path);
        assert!(store.load().unwrap().is_empty());
    }
}
