//! The pure election/replication state every node keeps under its mutex.
//!
//! Deliberately small: no log storage (that's `forgecluster-storage`), no
//! peer list (that's `forgecluster-registry`), no clocks (the runtime owns
//! `last_heartbeat` and timer scheduling). This is exactly the state the
//! top-level spec lists as consensus variables.

use forgecluster_types::{LogIndex, NodeId, Term};

use crate::role::Role;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaState {
    pub role: Role,
    pub term: Term,
    pub voted_for: Option<NodeId>,
    pub votes_received: usize,
    /// Index the next accepted command will be assigned, whether as leader
    /// (assigning) or follower (the next index this replica expects).
    pub next_log_index: LogIndex,
}

impl ReplicaState {
    #[must_use]
    pub fn new(term: Term, voted_for: Option<NodeId>, next_log_index: LogIndex) -> Self {
        Self {
            role: Role::Follower,
            term,
            voted_for,
            votes_received: 0,
            next_log_index,
        }
    }
}
