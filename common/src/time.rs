// Time types and the clock abstraction used by the vesting schedules
//
// IMPORTANT NOTE:
// SystemClock reads SystemTime::now() which is NON-DETERMINISTIC.
// Ledger operations never read the clock themselves: the environment reads it
// once per call and hands the timestamp down, so a simulated environment can
// inject its own Clock and replay calls exactly.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

/// Monotonic seconds-resolution clock read at call time
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds
    fn now(&self) -> TimestampSeconds;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampSeconds {
        get_current_time_in_seconds()
    }
}

#[inline]
pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

// Return timestamp in seconds
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}

/// Duration helpers expressed in seconds
pub mod duration {
    use super::TimestampSeconds;

    pub const fn seconds(n: u64) -> TimestampSeconds {
        n
    }

    pub const fn minutes(n: u64) -> TimestampSeconds {
        n * 60
    }

    pub const fn hours(n: u64) -> TimestampSeconds {
        minutes(n) * 60
    }

    pub const fn days(n: u64) -> TimestampSeconds {
        hours(n) * 24
    }

    pub const fn weeks(n: u64) -> TimestampSeconds {
        days(n) * 7
    }

    // A year is 365 days, leap days are not accounted for
    pub const fn years(n: u64) -> TimestampSeconds {
        days(n) * 365
    }
}

#[cfg(test)]
mod tests {
    use super::duration::*;
    use super::*;

    #[test]
    fn test_duration_helpers() {
        assert_eq!(seconds(5), 5);
        assert_eq!(minutes(1), 60);
        assert_eq!(hours(2), 7_200);
        assert_eq!(days(1), 86_400);
        assert_eq!(weeks(1), 604_800);
        assert_eq!(years(1), 31_536_000);
        assert_eq!(years(2), 2 * years(1));
    }

    #[test]
    fn test_system_clock_is_after_epoch() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
