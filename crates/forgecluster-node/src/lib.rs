//! `forgecluster-node`: the imperative shell that runs a single cluster
//! member. Wires the pure consensus core ([`forgecluster_consensus`]) and
//! domain kernel ([`forgecluster_kernel`]) to durable storage, the shared
//! peer registry, and the RPC layer, and owns the long-lived driver
//! threads that make the whole thing move forward on its own.

mod error;
mod node;
mod timers;

pub use error::NodeError;
pub use node::Node;
