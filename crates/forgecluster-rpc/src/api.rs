//! The narrow interface the node exposes to the RPC layer.
//!
//! The RPC layer only ever calls into the node through this trait; the
//! node never reaches back into the RPC layer. This keeps the dependency
//! one-way, in contrast to the mutually-calling node/server pair this was
//! modeled on.

use forgecluster_consensus::{Heartbeat, HeartbeatAck, Replicate, ReplicateAck, RequestVote, VoteResponse};
use forgecluster_kernel::{Command, Filament, Job, Printer};
use forgecluster_registry::Peer;
use forgecluster_storage::LogEntry;
use forgecluster_types::{LogIndex, NodeId, Term};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("this node is not the leader")]
    NotLeader,
    #[error(transparent)]
    Command(#[from] forgecluster_kernel::CommandError),
    #[error("failed to replicate to a majority of peers")]
    QuorumUnreachable,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub node_id: NodeId,
    pub role: &'static str,
    pub term: Term,
    pub peers: Vec<Peer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateView {
    pub printers: Vec<Printer>,
    pub filaments: Vec<Filament>,
    pub jobs: Vec<Job>,
    pub log_index: LogIndex,
}

/// Everything the RPC layer needs from a running node. Implemented by
/// `forgecluster-node`'s `Node`.
pub trait NodeApi: Send + Sync {
    fn handle_vote(&self, request: RequestVote) -> VoteResponse;
    fn handle_heartbeat(&self, request: Heartbeat) -> HeartbeatAck;
    fn handle_replicate(&self, request: Replicate) -> ReplicateAck;
    fn status(&self) -> StatusView;
    fn state(&self) -> StateView;
    fn logs_from(&self, from_index: LogIndex) -> Vec<LogEntry>;

    /// Validates and applies `command` if this node is currently leader;
    /// returns `SubmitError::NotLeader` otherwise so the RPC layer can
    /// answer with the spec's 403.
    fn submit_command(&self, command: Command) -> Result<(), SubmitError>;
}
