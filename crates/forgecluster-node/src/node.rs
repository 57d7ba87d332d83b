//! `Node`: the imperative shell around the pure consensus and kernel
//! cores. Owns the one mutex the top-level spec describes - role, term,
//! vote, and the in-memory domain state all move together under it - and
//! the four long-lived drivers that keep a node alive.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use forgecluster_consensus::{
    handle_heartbeat, handle_replicate_request, handle_vote_request, handle_vote_response,
    leader_append, start_election, Heartbeat, HeartbeatAck, Replicate, ReplicateAck, ReplicaState,
    RequestVote, Role, VoteResponse,
};
use forgecluster_kernel::{apply, Command, State};
use forgecluster_registry::{NodeIdentity, PeerRegistry, PeerStatus};
use forgecluster_rpc::{NodeApi, StateView, StatusView, SubmitError};
use forgecluster_storage::{LogEntry, NodeStore, Snapshot};
use forgecluster_types::LogIndex;
use tracing::{info, warn};

use crate::error::NodeError;
use crate::timers::{self, ElectionTimer};

struct Inner {
    replica: ReplicaState,
    state: State,
    entries: Vec<LogEntry>,
}

pub struct Node {
    identity: NodeIdentity,
    registry: PeerRegistry,
    store: NodeStore,
    inner: Mutex<Inner>,
    election_timer: ElectionTimer,
}

impl Node {
    /// Loads (or initializes) a node rooted at `data_dir`, registering
    /// itself as alive in the shared Peer Registry. Does not start serving
    /// yet - call [`Node::start`] on the returned, `Arc`-wrapped node.
    pub fn new(identity: NodeIdentity, data_dir: &Path) -> Result<Arc<Self>, NodeError> {
        let snapshot_path = data_dir.join(format!("state_{}.json", identity.node_id));
        let log_path = data_dir.join("logs").join(format!("log_{}.json", identity.port));
        let peers_path = data_dir.join("config").join("peers.json");

        let store = NodeStore::new(snapshot_path, log_path);
        let (snapshot, entries) = store.load()?;

        let registry = PeerRegistry::new(peers_path);
        registry.register(&identity.host, identity.port)?;

        let replica = ReplicaState::new(
            snapshot.term,
            snapshot.voted_for,
            LogIndex::new(entries.len() as u64),
        );

        let node = Self {
            identity,
            registry,
            store,
            inner: Mutex::new(Inner {
                replica,
                state: snapshot.state,
                entries,
            }),
            election_timer: ElectionTimer::new(),
        };
        Ok(Arc::new(node))
    }

    #[must_use]
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    fn self_addr(&self) -> String {
        format!("{}:{}", self.identity.host, self.identity.port)
    }

    fn persist(&self, inner: &Inner) -> Result<(), forgecluster_storage::StorageError> {
        let snapshot = Snapshot {
            term: inner.replica.term,
            voted_for: inner.replica.voted_for.clone(),
            state: inner.state.clone(),
            last_applied: inner.entries.last().map(|e| e.index),
        };
        self.store.save(&snapshot, &inner.entries)
    }

    /// Starts the four long-lived drivers described in the concurrency
    /// model: the RPC acceptor, the election timer, the heartbeat emitter
    /// (only effective while leader), and peer discovery. Returns their
    /// join handles; the caller joins them to block the process.
    #[must_use]
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let rpc_node: Arc<dyn NodeApi> = self.clone();
        let addr = self.self_addr();
        handles.push(std::thread::spawn(move || {
            if let Err(err) = forgecluster_rpc::serve(&addr, rpc_node) {
                tracing::error!(error = %err, "rpc server exited");
            }
        }));

        let election = Arc::clone(self);
        handles.push(std::thread::spawn(move || election.run_election_driver()));

        let heartbeat = Arc::clone(self);
        handles.push(std::thread::spawn(move || heartbeat.run_heartbeat_driver()));

        let discovery = Arc::clone(self);
        handles.push(std::thread::spawn(move || discovery.run_discovery_driver()));

        handles
    }

    /// Marks self dead in the registry and clears the leader pointer if
    /// every peer is now dead.
    pub fn shutdown(&self) {
        if let Err(err) = self.registry.mark(&self.identity.host, self.identity.port, PeerStatus::Dead) {
            warn!(error = %err, "failed to mark self dead on shutdown");
        }
        if let Err(err) = self.registry.clear_leader_if_all_dead() {
            warn!(error = %err, "failed to clear leader pointer on shutdown");
        }
    }

    fn run_election_driver(self: Arc<Self>) {
        loop {
            std::thread::sleep(timers::ELECTION_POLL);
            let is_leader = self.inner.lock().unwrap().replica.role == Role::Leader;
            if is_leader {
                continue;
            }
            if self.election_timer.expired() {
                self.start_election();
            }
        }
    }

    fn start_election(&self) {
        let alive = match self.registry.list_alive_except_self(&self.identity.host, self.identity.port) {
            Ok(alive) => alive,
            Err(err) => {
                warn!(error = %err, "failed to read peer registry before election");
                return;
            }
        };

        let (candidate_term, request) = {
            let mut inner = self.inner.lock().unwrap();
            let (next, request) = start_election(&inner.replica, &self.identity.node_id);
            let term = next.term;
            inner.replica = next;
            if let Err(err) = self.persist(&inner) {
                warn!(error = %err, "failed to persist election state");
            }
            (term, request)
        };
        self.election_timer.reset();
        info!(term = candidate_term.get(), "starting election");

        let total = alive.len() + 1;
        // `start_election` already counted the self-vote; only fold in
        // grants from peers that actually answered.
        let mut external_grants = 0usize;
        for peer in &alive {
            let addr = format!("{}:{}", peer.host, peer.port);
            match forgecluster_rpc::request_vote(&addr, &request, timers::RPC_TIMEOUT) {
                Ok(VoteResponse { vote_granted: true }) => external_grants += 1,
                Ok(_) => {}
                Err(_) => {
                    let _ = self.registry.mark(&peer.host, peer.port, PeerStatus::Dead);
                }
            }
        }

        let became_leader = {
            let mut inner = self.inner.lock().unwrap();
            // Only fold the tally in if this replica is still the candidate
            // it was when the round started - a heartbeat or a higher-term
            // vote request may have already moved it on.
            if inner.replica.term == candidate_term && inner.replica.role == Role::Candidate {
                for _ in 0..external_grants {
                    inner.replica = handle_vote_response(&inner.replica, true, total);
                }
            }
            inner.replica.role == Role::Leader
        };

        if became_leader {
            info!(term = candidate_term.get(), "elected leader");
            if let Err(err) = self.registry.set_leader(&self.identity.host, self.identity.port, &self.identity.node_id) {
                warn!(error = %err, "failed to publish self as leader");
            }
            self.sync_state_from_peers(&alive);
        }
    }

    fn run_heartbeat_driver(self: Arc<Self>) {
        loop {
            std::thread::sleep(timers::HEARTBEAT_PERIOD);
            let (is_leader, term) = {
                let inner = self.inner.lock().unwrap();
                (inner.replica.role == Role::Leader, inner.replica.term)
            };
            if !is_leader {
                continue;
            }

            let alive = match self.registry.list_alive_except_self(&self.identity.host, self.identity.port) {
                Ok(alive) => alive,
                Err(err) => {
                    warn!(error = %err, "failed to read peer registry before heartbeat");
                    continue;
                }
            };
            let heartbeat = Heartbeat {
                term,
                leader_id: self.identity.node_id.clone(),
            };
            for peer in &alive {
                let addr = format!("{}:{}", peer.host, peer.port);
                if forgecluster_rpc::send_heartbeat(&addr, &heartbeat, timers::RPC_TIMEOUT).is_err() {
                    let _ = self.registry.mark(&peer.host, peer.port, PeerStatus::Dead);
                }
            }
        }
    }

    fn run_discovery_driver(self: Arc<Self>) {
        let mut known_peer_count = 0usize;
        loop {
            std::thread::sleep(timers::DISCOVERY_PERIOD);
            let alive = match self.registry.list_alive_except_self(&self.identity.host, self.identity.port) {
                Ok(alive) => alive,
                Err(err) => {
                    warn!(error = %err, "failed to read peer registry during discovery");
                    continue;
                }
            };
            if alive.len() > known_peer_count {
                info!("new peers detected, syncing with leader");
                self.sync_state_from_peers(&alive);
            }
            known_peer_count = alive.len();
        }
    }

    /// One-shot follower sync: find the leader among `peers`, pull its full
    /// state as the new baseline, then backfill the local log with
    /// whatever entries sit past this node's own tail.
    ///
    /// The pulled `/state` snapshot is already the leader's current state,
    /// so entries fetched afterward are appended to the local log for
    /// bookkeeping only - they are not re-applied through the kernel,
    /// which would double-count anything the snapshot already reflects.
    fn sync_state_from_peers(&self, peers: &[forgecluster_registry::Peer]) {
        for peer in peers {
            let addr = format!("{}:{}", peer.host, peer.port);
            let Ok(status) = forgecluster_rpc::fetch_status(&addr, timers::RPC_TIMEOUT) else {
                continue;
            };
            if status.role != "leader" {
                continue;
            }
            let Ok(remote_state) = forgecluster_rpc::fetch_state(&addr, timers::RPC_TIMEOUT) else {
                continue;
            };

            let mut inner = self.inner.lock().unwrap();
            inner.state = State {
                printers: remote_state.printers.into_iter().map(|p| (p.id.clone(), p)).collect(),
                filaments: remote_state.filaments.into_iter().map(|f| (f.id.clone(), f)).collect(),
                jobs: remote_state.jobs.into_iter().map(|j| (j.id.clone(), j)).collect(),
            };

            let from_index = LogIndex::new(inner.entries.len() as u64);
            if let Ok(new_entries) = forgecluster_rpc::fetch_logs_from(&addr, from_index, timers::RPC_TIMEOUT) {
                inner.entries.extend(new_entries);
            }
            inner.replica.next_log_index = LogIndex::new(inner.entries.len() as u64);
            if let Err(err) = self.persist(&inner) {
                warn!(error = %err, "failed to persist after follower sync");
            }
            info!("follower sync complete");
            return;
        }
    }
}

impl NodeApi for Node {
    fn handle_vote(&self, request: RequestVote) -> VoteResponse {
        let mut inner = self.inner.lock().unwrap();
        let (next, response) = handle_vote_request(&inner.replica, &request);
        inner.replica = next;
        if response.vote_granted {
            if let Err(err) = self.persist(&inner) {
                warn!(error = %err, "failed to persist granted vote");
            }
            self.election_timer.reset();
        }
        response
    }

    fn handle_heartbeat(&self, request: Heartbeat) -> HeartbeatAck {
        let mut inner = self.inner.lock().unwrap();
        let (next, ack) = handle_heartbeat(&inner.replica, &request);
        let term_changed = next.term != inner.replica.term;
        inner.replica = next;
        if ack.success {
            if term_changed {
                if let Err(err) = self.persist(&inner) {
                    warn!(error = %err, "failed to persist heartbeat term bump");
                }
            }
            self.election_timer.reset();
        }
        ack
    }

    fn handle_replicate(&self, request: Replicate) -> ReplicateAck {
        let mut inner = self.inner.lock().unwrap();
        let (next, ack) = handle_replicate_request(&inner.replica, &request);
        if !ack.success {
            inner.replica = next;
            return ack;
        }

        match apply(inner.state.clone(), request.command.clone()) {
            Ok((next_state, _effects)) => {
                inner.state = next_state;
                inner.entries.push(LogEntry {
                    index: request.log_index,
                    term: request.term,
                    command: request.command,
                    timestamp: now(),
                });
                inner.replica = next;
                if let Err(err) = self.persist(&inner) {
                    warn!(error = %err, "failed to persist replicated entry");
                }
                ack
            }
            Err(err) => {
                warn!(error = %err, "rejected replicate: command no longer applies");
                ReplicateAck {
                    success: false,
                    log_index: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn status(&self) -> StatusView {
        let inner = self.inner.lock().unwrap();
        let role = match inner.replica.role {
            Role::Follower => "follower",
            Role::Candidate => "candidate",
            Role::Leader => "leader",
        };
        let peers = self.registry.list_all().unwrap_or_default();
        StatusView {
            node_id: self.identity.node_id.clone(),
            role,
            term: inner.replica.term,
            peers,
        }
    }

    fn state(&self) -> StateView {
        let inner = self.inner.lock().unwrap();
        StateView {
            printers: inner.state.printers.values().cloned().collect(),
            filaments: inner.state.filaments.values().cloned().collect(),
            jobs: inner.state.jobs.values().cloned().collect(),
            log_index: inner.replica.next_log_index,
        }
    }

    fn logs_from(&self, from_index: LogIndex) -> Vec<LogEntry> {
        let inner = self.inner.lock().unwrap();
        inner
            .entries
            .iter()
            .filter(|e| e.index >= from_index)
            .cloned()
            .collect()
    }

    fn submit_command(&self, command: Command) -> Result<(), SubmitError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.replica.role != Role::Leader {
            return Err(SubmitError::NotLeader);
        }

        let (next_state, _effects) = apply(inner.state.clone(), command.clone())?;
        let (next_replica, log_index) = leader_append(&inner.replica);
        let term = inner.replica.term;

        let alive = self
            .registry
            .list_alive_except_self(&self.identity.host, self.identity.port)
            .unwrap_or_default();
        let mut successes = 1usize;
        for peer in &alive {
            let addr = format!("{}:{}", peer.host, peer.port);
            let request = Replicate {
                term,
                leader_id: self.identity.node_id.clone(),
                command: command.clone(),
                log_index,
            };
            match forgecluster_rpc::send_replicate(&addr, &request, timers::RPC_TIMEOUT) {
                Ok(ack) if ack.success => successes += 1,
                _ => {
                    let _ = self.registry.mark(&peer.host, peer.port, PeerStatus::Dead);
                }
            }
        }

        if !forgecluster_consensus::is_majority(successes, alive.len() + 1) {
            return Err(SubmitError::QuorumUnreachable);
        }

        inner.state = next_state;
        inner.replica = next_replica;
        inner.entries.push(LogEntry {
            index: log_index,
            term,
            command,
            timestamp: now(),
        });
        if let Err(err) = self.persist(&inner) {
            warn!(error = %err, "failed to persist accepted command");
        }
        Ok(())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
