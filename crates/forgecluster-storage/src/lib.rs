//! `forgecluster-storage`: the durable stores each node keeps on disk.
//!
//! Two files per node - a [`Snapshot`] of consensus state plus the full
//! domain [`forgecluster_kernel::State`], and a [`LogEntry`] list - both
//! rewritten atomically via write-to-temp-then-rename so a crash mid-write
//! never leaves a half-written file for the next startup to choke on.

mod atomic;
mod error;
mod log;
mod snapshot;
mod store;

pub use error::StorageError;
pub use log::{LogEntry, LogStore};
pub use snapshot::{Snapshot, SnapshotStore};
pub use store::NodeStore;
