//! Pure handlers for every consensus transition the top-level spec names.
//!
//! Each takes the current [`ReplicaState`] by reference and returns the
//! next state plus whatever reply belongs on the wire. No IO, no clocks:
//! the runtime decides *when* to call `start_election` (on election
//! timeout) or `leader_append` (on an accepted client mutation), persists
//! the returned state, and sends the returned message.

use forgecluster_types::{LogIndex, NodeId, Term};

use crate::message::{Heartbeat, HeartbeatAck, Replicate, ReplicateAck, RequestVote, VoteResponse};
use crate::quorum::is_majority;
use crate::role::Role;
use crate::state::ReplicaState;

/// Begins an election: bumps the term, votes for self, and returns the
/// `RequestVote` to fan out to every alive peer.
#[must_use]
pub fn start_election(state: &ReplicaState, self_id: &NodeId) -> (ReplicaState, RequestVote) {
    let term = state.term.next();
    let next = ReplicaState {
        role: Role::Candidate,
        term,
        voted_for: Some(self_id.clone()),
        votes_received: 1,
        next_log_index: state.next_log_index,
    };
    let request = RequestVote {
        term,
        candidate_id: self_id.clone(),
    };
    (next, request)
}

/// Handles an incoming `RequestVote`. Grants the vote iff, after bumping
/// to the requester's term when it's newer, this replica hasn't already
/// voted this term.
#[must_use]
pub fn handle_vote_request(state: &ReplicaState, request: &RequestVote) -> (ReplicaState, VoteResponse) {
    let mut next = state.clone();
    if request.term > next.term {
        next.term = request.term;
        next.voted_for = None;
        next.role = Role::Follower;
    }

    let granted = next.voted_for.is_none() && request.term == next.term;
    if granted {
        next.voted_for = Some(request.candidate_id.clone());
    }
    (next, VoteResponse { vote_granted: granted })
}

/// Folds one `VoteResponse` into a candidate's tally. A no-op outside the
/// `Candidate` role (a stale response from an election this replica has
/// already left).
#[must_use]
pub fn handle_vote_response(
    state: &ReplicaState,
    granted: bool,
    alive_peers_plus_self: usize,
) -> ReplicaState {
    if state.role != Role::Candidate {
        return state.clone();
    }
    let mut next = state.clone();
    if granted {
        next.votes_received += 1;
    }
    if is_majority(next.votes_received, alive_peers_plus_self) {
        next.role = Role::Leader;
    }
    next
}

/// Handles an incoming `Heartbeat`. A heartbeat at or above the current
/// term always steps this replica down to follower and clears its vote,
/// even if it was already a follower - this is what lets a revived
/// follower re-synchronize its term with almost no special-casing.
#[must_use]
pub fn handle_heartbeat(state: &ReplicaState, heartbeat: &Heartbeat) -> (ReplicaState, HeartbeatAck) {
    if heartbeat.term < state.term {
        return (state.clone(), HeartbeatAck { success: false });
    }
    let next = ReplicaState {
        role: Role::Follower,
        term: heartbeat.term,
        voted_for: None,
        votes_received: 0,
        next_log_index: state.next_log_index,
    };
    (next, HeartbeatAck { success: true })
}

/// Handles an incoming `Replicate`. Rejects a stale term or a request
/// received while this replica is itself a leader (a term collision for
/// the next heartbeat/election round to resolve); otherwise steps down to
/// follower and accepts.
#[must_use]
pub fn handle_replicate_request(state: &ReplicaState, request: &Replicate) -> (ReplicaState, ReplicateAck) {
    if request.term < state.term {
        return (
            state.clone(),
            ReplicateAck {
                success: false,
                log_index: None,
                error: Some("term is outdated".to_string()),
            },
        );
    }
    if state.role == Role::Leader {
        return (
            state.clone(),
            ReplicateAck {
                success: false,
                log_index: None,
                error: Some("already leader".to_string()),
            },
        );
    }

    let next = ReplicaState {
        role: Role::Follower,
        term: request.term,
        voted_for: state.voted_for.clone(),
        votes_received: 0,
        next_log_index: request.log_index.next(),
    };
    (
        next,
        ReplicateAck {
            success: true,
            log_index: Some(request.log_index),
            error: None,
        },
    )
}

/// Leader-side bookkeeping for a locally accepted client mutation: assigns
/// the next log index and advances the counter. Callers must check
/// `state.role == Role::Leader` first; this function doesn't, since the
/// node layer already rejects non-leader mutations with `NotLeader` before
/// ever reaching here.
#[must_use]
pub fn leader_append(state: &ReplicaState) -> (ReplicaState, LogIndex) {
    let assigned = state.next_log_index;
    let next = ReplicaState {
        next_log_index: assigned.next(),
        ..state.clone()
    };
    (next, assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower(term: u64) -> ReplicaState {
        ReplicaState::new(Term::new(term), None, LogIndex::new(0))
    }

    #[test]
    fn election_bumps_term_and_votes_for_self() {
        let state = follower(2);
        let (next, request) = start_election(&state, &NodeId::from_port(5001));
        assert_eq!(next.role, Role::Candidate);
        assert_eq!(next.term, Term::new(3));
        assert_eq!(next.voted_for, Some(NodeId::from_port(5001)));
        assert_eq!(next.votes_received, 1);
        assert_eq!(request.term, Term::new(3));
    }

    #[test]
    fn grants_vote_once_per_term_then_refuses_a_second_candidate() {
        let state = follower(2);
        let request_a = RequestVote {
            term: Term::new(3),
            candidate_id: NodeId::from_port(5001),
        };
        let (state, response) = handle_vote_request(&state, &request_a);
        assert!(response.vote_granted);

        let request_b = RequestVote {
            term: Term::new(3),
            candidate_id: NodeId::from_port(5002),
        };
        let (_, response) = handle_vote_request(&state, &request_b);
        assert!(!response.vote_granted);
    }

    #[test]
    fn higher_term_vote_request_resets_prior_vote() {
        let state = follower(2);
        let (state, _) = handle_vote_request(
            &state,
            &RequestVote {
                term: Term::new(3),
                candidate_id: NodeId::from_port(5001),
            },
        );

        let (_, response) = handle_vote_request(
            &state,
            &RequestVote {
                term: Term::new(4),
                candidate_id: NodeId::from_port(5002),
            },
        );
        assert!(response.vote_granted);
    }

    #[test]
    fn candidate_becomes_leader_on_majority() {
        let mut state = start_election(&follower(0), &NodeId::from_port(5001)).0;
        state = handle_vote_response(&state, true, 3);
        assert_eq!(state.role, Role::Candidate);
        state = handle_vote_response(&state, true, 3);
        assert_eq!(state.role, Role::Leader);
    }

    #[test]
    fn heartbeat_steps_down_a_stale_leader() {
        let leader = ReplicaState {
            role: Role::Leader,
            term: Term::new(2),
            voted_for: Some(NodeId::from_port(5001)),
            votes_received: 2,
            next_log_index: LogIndex::new(4),
        };
        let (next, ack) = handle_heartbeat(
            &leader,
            &Heartbeat {
                term: Term::new(3),
                leader_id: NodeId::from_port(5002),
            },
        );
        assert!(ack.success);
        assert_eq!(next.role, Role::Follower);
        assert_eq!(next.term, Term::new(3));
        assert_eq!(next.voted_for, None);
    }

    #[test]
    fn stale_heartbeat_is_rejected() {
        let state = follower(5);
        let (next, ack) = handle_heartbeat(
            &state,
            &Heartbeat {
                term: Term::new(4),
                leader_id: NodeId::from_port(5002),
            },
        );
        assert!(!ack.success);
        assert_eq!(next.term, Term::new(5));
    }

    #[test]
    fn replicate_rejects_stale_term_and_existing_leader() {
        let state = follower(5);
        let (_, ack) = handle_replicate_request(
            &state,
            &Replicate {
                term: Term::new(4),
                leader_id: NodeId::from_port(5002),
                command: forgecluster_kernel::Command::AddPrinter {
                    id: "p1".to_string(),
                    company: "Prusa".to_string(),
                    model: "MK3".to_string(),
                },
                log_index: LogIndex::new(0),
            },
        );
        assert!(!ack.success);

        let leader = ReplicaState {
            role: Role::Leader,
            ..follower(5)
        };
        let (_, ack) = handle_replicate_request(
            &leader,
            &Replicate {
                term: Term::new(5),
                leader_id: NodeId::from_port(5002),
                command: forgecluster_kernel::Command::AddPrinter {
                    id: "p1".to_string(),
                    company: "Prusa".to_string(),
                    model: "MK3".to_string(),
                },
                log_index: LogIndex::new(0),
            },
        );
        assert!(!ack.success);
    }

    #[test]
    fn replicate_accepts_and_advances_next_log_index() {
        let state = follower(5);
        let (next, ack) = handle_replicate_request(
            &state,
            &Replicate {
                term: Term::new(5),
                leader_id: NodeId::from_port(5002),
                command: forgecluster_kernel::Command::AddPrinter {
                    id: "p1".to_string(),
                    company: "Prusa".to_string(),
                    model: "MK3".to_string(),
                },
                log_index: LogIndex::new(7),
            },
        );
        assert!(ack.success);
        assert_eq!(ack.log_index, Some(LogIndex::new(7)));
        assert_eq!(next.next_log_index, LogIndex::new(8));
    }

    #[test]
    fn leader_append_assigns_dense_indices() {
        let mut state = ReplicaState {
            role: Role::Leader,
            ..follower(5)
        };
        let (next, first) = leader_append(&state);
        state = next;
        let (next, second) = leader_append(&state);
        assert_eq!(first, LogIndex::new(0));
        assert_eq!(second, LogIndex::new(1));
        let _ = next;
    }
}
