//! Wire payloads exchanged between replicas. Plain data - the RPC layer
//! serializes these to and from JSON; nothing in this module touches a
//! socket.

use forgecluster_kernel::Command;
use forgecluster_types::{LogIndex, NodeId, Term};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestVote {
    pub term: Term,
    pub candidate_id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub vote_granted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub term: Term,
    pub leader_id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatAck {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replicate {
    pub term: Term,
    pub leader_id: NodeId,
    pub command: Command,
    pub log_index: LogIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_index: Option<LogIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
