//! Routing failures: everything that can go wrong finding or reaching the
//! leader, before a request ever gets a chance to be validated by it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("No active leader found in the cluster. Please try again in a few moments.")]
    NoLeader,
    #[error("Unable to connect to leader node.")]
    LeaderUnreachable,
    #[error("Connection to leader timed out.")]
    LeaderTimeout,
    #[error(transparent)]
    Registry(#[from] forgecluster_registry::RegistryError),
}
