// File: testing-framework/src/orchestrator/clock.rs
//
// Manual Clock - Deterministic Time Control
//
// Ledger time only moves when a test moves it. This mirrors the
// `evm_increaseTime` style of time travel: the clock can be increased by a
// duration or to a target timestamp, never moved backwards.

use std::sync::atomic::{AtomicU64, Ordering};

use aha_common::time::{Clock, TimestampSeconds};
use anyhow::{bail, Result};

/// Default genesis timestamp for test chains (2023-11-14T22:13:20Z)
pub const GENESIS_TIMESTAMP: TimestampSeconds = 1_700_000_000;

/// Deterministic seconds clock advanced explicitly by the test
///
/// # Examples
///
/// ```rust
/// use aha_common::time::{duration, Clock};
/// use aha_testing_framework::orchestrator::ManualClock;
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(duration::minutes(1));
/// assert_eq!(clock.now(), 1_060);
///
/// clock.increase_to(2_000).unwrap();
/// assert!(clock.increase_to(1_500).is_err());
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: TimestampSeconds) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move time forward by `seconds`, saturating at the end of time
    pub fn advance(&self, seconds: TimestampSeconds) -> TimestampSeconds {
        let mut current = self.now.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(seconds);
            match self
                .now
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Jump to `target`, which must not be in the past
    pub fn increase_to(&self, target: TimestampSeconds) -> Result<()> {
        let now = self.now.load(Ordering::SeqCst);
        if target < now {
            bail!(
                "Cannot increase current time ({}) to a moment in the past ({})",
                now,
                target
            );
        }
        self.now.store(target, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(GENESIS_TIMESTAMP)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimestampSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
