//! `forgecluster-router`: the stateless client-facing proxy.
//!
//! Holds no state of its own beyond a handle to the shared Peer Registry -
//! every request re-reads the current `LeaderPointer` and forwards
//! verbatim. This is deliberately thin: the interesting logic (leader
//! election, replication) all lives in `forgecluster-node`.

mod error;
mod server;

pub use error::RouterError;
pub use server::serve;
