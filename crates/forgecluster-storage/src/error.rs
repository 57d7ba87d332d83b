//! Error taxonomy for the durable stores.
//!
//! Corrupt files are not fatal - [`crate::snapshot::SnapshotStore::load`] and
//! [`crate::log::LogStore::load`] handle that themselves by resetting to an
//! empty value and logging a warning. This enum covers what's left: IO
//! failures the caller can't recover from on its own.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("filesystem error")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize durable state")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Command(#[from] forgecluster_kernel::CommandError),
}
