//! Heartbeat cadence.

use std::time::Duration;

use minstant::Instant;

/// Decides when the periodic heartbeat is due.
///
/// Fires at most once per interval and resets its reference to the firing
/// instant, so consecutive beats are at least one interval apart no matter
/// how often the loop asks. Cadence is shared by all sessions; it does not
/// depend on how many are live.
#[derive(Debug)]
pub struct HeartbeatTicker {
    interval: Duration,
    last_fired: Instant,
}

impl HeartbeatTicker {
    /// Ticker whose first beat falls one full interval after `start`.
    #[must_use]
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_fired: start,
        }
    }

    /// True when a full interval has elapsed since the last beat.
    pub fn is_due(&mut self, now: Instant) -> bool {
        let due = now
            .checked_duration_since(self.last_fired)
            .is_some_and(|elapsed| elapsed >= self.interval);
        if due {
            self.last_fired = now;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval() {
        let start = Instant::now();
        let mut ticker = HeartbeatTicker::new(Duration::from_secs(2), start);
        assert!(!ticker.is_due(start));
        assert!(!ticker.is_due(start + Duration::from_millis(1999)));
        assert!(ticker.is_due(start + Duration::from_secs(2)));
        // The reference moved to the firing instant.
        assert!(!ticker.is_due(start + Duration::from_millis(3999)));
        assert!(ticker.is_due(start + Duration::from_secs(4)));
    }

    #[test]
    fn late_poll_yields_a_single_beat() {
        let start = Instant::now();
        let mut ticker = HeartbeatTicker::new(Duration::from_secs(2), start);
        assert!(ticker.is_due(start + Duration::from_secs(7)));
        assert!(!ticker.is_due(start + Duration::from_secs(7)));
        assert!(!ticker.is_due(start + Duration::from_millis(8999)));
        assert!(ticker.is_due(start + Duration::from_secs(9)));
    }

    #[test]
    fn instants_before_the_reference_are_not_due() {
        let base = Instant::now();
        let start = base + Duration::from_secs(10);
        let mut ticker = HeartbeatTicker::new(Duration::from_secs(2), start);
        assert!(!ticker.is_due(base));
    }
}
