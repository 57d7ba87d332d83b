//! Majority computation.
//!
//! Quorum is computed against "alive peers + 1" (self), not the full
//! configured cluster size. Under a network partition where some nodes are
//! merely unreachable rather than actually down, two sides can both see a
//! majority of who they think is alive and elect two leaders; this
//! implementation keeps that behavior rather than requiring the full
//! cluster size; see the crate-level docs for the hazard.

/// `true` if `count` exceeds `floor(alive_peers_plus_self / 2)`.
#[must_use]
pub const fn is_majority(count: usize, alive_peers_plus_self: usize) -> bool {
    count > alive_peers_plus_self / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 1 => true; "lone node is its own majority")]
    #[test_case(2, 3 => true; "two of three")]
    #[test_case(1, 3 => false; "one of three")]
    #[test_case(2, 5 => false; "two of five")]
    #[test_case(3, 5 => true; "three of five")]
    fn majority_matches_floor_plus_one_rule(count: usize, total: usize) -> bool {
        is_majority(count, total)
    }
}
