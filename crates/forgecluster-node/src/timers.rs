//! Election timing: the deadline a node compares against on every poll.
//!
//! Kept separate from [`crate::node::Node`]'s domain mutex since it's
//! touched far more often (every 0.5s poll) than the state it gates, and
//! nothing about it needs to be consistent with a state mutation.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

pub const T_MIN: Duration = Duration::from_secs(5);
pub const T_MAX: Duration = Duration::from_secs(10);
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(2);
pub const ELECTION_POLL: Duration = Duration::from_millis(500);
pub const DISCOVERY_PERIOD: Duration = Duration::from_secs(30);
pub const RPC_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ElectionTimer {
    deadline: Mutex<Instant>,
}

impl ElectionTimer {
    #[must_use]
    pub fn new() -> Self {
        let timer = Self {
            deadline: Mutex::new(Instant::now()),
        };
        timer.reset();
        timer
    }

    /// Draws a fresh timeout uniformly from `[T_MIN, T_MAX]` and resets the
    /// deadline from now. Called on every granted vote and every heartbeat
    /// accepted at or above the current term.
    pub fn reset(&self) {
        let millis = rand::thread_rng().gen_range(T_MIN.as_millis()..=T_MAX.as_millis());
        let mut deadline = self.deadline.lock().unwrap();
        *deadline = Instant::now() + Duration::from_millis(millis as u64);
    }

    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() >= *self.deadline.lock().unwrap()
    }
}

impl Default for ElectionTimer {
    fn default() -> Self {
        Self::new()
    }
}
