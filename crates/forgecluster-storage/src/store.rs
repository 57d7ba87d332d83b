//! Ties the snapshot and log stores together and implements the one
//! operation neither can do alone: reconciling them at startup.

use std::path::Path;

use forgecluster_kernel::apply;
use tracing::{info, warn};

use crate::error::StorageError;
use crate::log::{LogEntry, LogStore};
use crate::snapshot::{Snapshot, SnapshotStore};

/// The durable state of a single node: its snapshot and its command log.
pub struct NodeStore {
    snapshots: SnapshotStore,
    log: LogStore,
}

impl NodeStore {
    #[must_use]
    pub fn new(snapshot_path: impl Into<std::path::PathBuf>, log_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            snapshots: SnapshotStore::new(snapshot_path),
            log: LogStore::new(log_path),
        }
    }

    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        self.snapshots.path()
    }

    /// Loads the snapshot and log and reconciles them: any log entry past
    /// `snapshot.last_applied` is replayed through the kernel before the
    /// node starts serving.
    ///
    /// A command that fails to reapply (e.g. a log entry recorded before a
    /// kernel rule changed) is logged and skipped rather than treated as
    /// fatal - the node still has a usable, if slightly behind, state.
    pub fn load(&self) -> Result<(Snapshot, Vec<LogEntry>), StorageError> {
        let mut snapshot = self.snapshots.load()?;
        let entries = self.log.load()?;

        let tail: Vec<_> = entries
            .iter()
            .filter(|e| snapshot.last_applied.is_none_or(|applied| e.index > applied))
            .collect();
        if !tail.is_empty() {
            info!(entries = tail.len(), "replaying unsnapshotted log tail");
        }
        for entry in &tail {
            match apply(snapshot.state.clone(), entry.command.clone()) {
                Ok((next_state, _effects)) => {
                    snapshot.state = next_state;
                    snapshot.term = snapshot.term.max(entry.term);
                    snapshot.last_applied = Some(entry.index);
                }
                Err(err) => {
                    warn!(index = entry.index.get(), error = %err, "skipping log entry that no longer applies");
                }
            }
        }

        Ok((snapshot, entries))
    }

    /// Persists `snapshot` (after a command is applied) and the full
    /// updated `entries` list (after an entry is appended).
    pub fn save(&self, snapshot: &Snapshot, entries: &[LogEntry]) -> Result<(), StorageError> {
        self.snapshots.save(snapshot)?;
        self.log.save(entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgecluster_kernel::Command;
    use forgecluster_types::{LogIndex, Term};

    fn entry(index: u64, id: &str) -> LogEntry {
        LogEntry {
            index: LogIndex::new(index),
            term: Term::new(1),
            command: Command::AddPrinter {
                id: id.to_string(),
                company: "Prusa".to_string(),
                model: "MK3".to_string(),
            },
            timestamp: "2026-07-26T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn fresh_node_starts_from_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = NodeStore::new(dir.path().join("snapshot.json"), dir.path().join("log.json"));
        let (snapshot, entries) = store.load().unwrap();
        assert!(snapshot.state.printers.is_empty());
        assert!(entries.is_empty());
    }

    #[test]
    fn log_tail_replays_through_kernel_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let log_store = LogStore::new(dir.path().join("log.json"));
        log_store.save(&[entry(0, "p1"), entry(1, "p2")]).unwrap();

        let store = NodeStore::new(dir.path().join("snapshot.json"), dir.path().join("log.json"));
        let (snapshot, _) = store.load().unwrap();

        assert!(snapshot.state.printers.contains_key("p1"));
        assert!(snapshot.state.printers.contains_key("p2"));
        assert_eq!(snapshot.last_applied, Some(LogIndex::new(1)));
    }

    #[test]
    fn already_applied_entries_are_not_replayed_twice() {
        let dir = tempfile::tempdir().unwrap();
        let store = NodeStore::new(dir.path().join("snapshot.json"), dir.path().join("log.json"));

        let (mut snapshot, _) = store.load().unwrap();
        let (next_state, _) = apply(
            snapshot.state.clone(),
            Command::AddPrinter {
                id: "p1".to_string(),
                company: "Prusa".to_string(),
                model: "MK3".to_string(),
            },
        )
        .unwrap();
        snapshot.state = next_state;
        snapshot.last_applied = Some(LogIndex::new(0));
        store.save(&snapshot, &[entry(0, "p1")]).unwrap();

        // Reloading must not reapply entry 0 (which would fail as a
        // duplicate id) since it's already reflected in the snapshot.
        let (reloaded, _) = store.load().unwrap();
        assert!(reloaded.state.printers.contains_key("p1"));
        assert_eq!(reloaded.last_applied, Some(LogIndex::new(0)));
    }
}
