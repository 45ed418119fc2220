// File: testing-framework/src/orchestrator/mod.rs
//
// Orchestrator Module - Deterministic Infrastructure
//
// Time is the only source of non-determinism for the ledger contracts, so
// the orchestrator is a shared manual clock and a way to build a chain on it.

/// Manual clock for deterministic time control in tests
pub mod clock;

use std::sync::Arc;

pub use clock::{ManualClock, GENESIS_TIMESTAMP};

use crate::chain::TestChain;
use aha_common::time::TimestampSeconds;

/// Chain plus a handle on the clock it reads
///
/// The clock is shared, so advancing it through either handle is seen by
/// the chain on its next call.
pub struct DeterministicTestEnv {
    /// Clock shared with the chain
    pub clock: Arc<ManualClock>,
    /// The ledger environment
    pub chain: TestChain,
}

impl DeterministicTestEnv {
    /// Environment starting at [`GENESIS_TIMESTAMP`]
    pub fn new() -> Self {
        Self::starting_at(GENESIS_TIMESTAMP)
    }

    /// Environment starting at `timestamp`
    pub fn starting_at(timestamp: TimestampSeconds) -> Self {
        let clock = Arc::new(ManualClock::new(timestamp));
        let chain = TestChain::with_clock(clock.clone());
        Self { clock, chain }
    }
}

impl Default for DeterministicTestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aha_common::time::Clock;

    #[test]
    fn test_env_shares_clock() {
        let env = DeterministicTestEnv::starting_at(500);
        env.clock.advance(25);
        assert_eq!(env.chain.now(), 525);
        assert_eq!(env.clock.now(), 525);
    }
}
