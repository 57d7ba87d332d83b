//! `forgecluster-consensus`: the pure replica state machine.
//!
//! Election, heartbeat, and replication, exactly as specified for a small
//! fixed cluster - no view changes, no reconfiguration, no repair of
//! divergent follower suffixes, no clock synchronization. [`ReplicaState`]
//! holds only the consensus variables (role, term, vote, next log index);
//! everything else - peer liveness, the domain state, timers - belongs to
//! the storage, registry, and node layers.

mod handlers;
mod message;
mod quorum;
mod role;
mod state;

pub use handlers::{
    handle_heartbeat, handle_replicate_request, handle_vote_request, handle_vote_response,
    leader_append, start_election,
};
pub use message::{Heartbeat, HeartbeatAck, Replicate, ReplicateAck, RequestVote, VoteResponse};
pub use quorum::is_majority;
pub use role::Role;
pub use state::ReplicaState;
