//! Startup-time failures. Once running, a node reports failures through
//! `forgecluster_rpc::SubmitError` instead - this enum only covers what
//! can go wrong before it starts serving.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Storage(#[from] forgecluster_storage::StorageError),
    #[error(transparent)]
    Registry(#[from] forgecluster_registry::RegistryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
