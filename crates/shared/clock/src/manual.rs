use chrono::{Duration, Utc};
use hermes_core::Timestamp;
use hermes_ports::Clock;
use parking_lot::RwLock;
use std::sync::Arc;

/// Clock frozen at a point in time
///
/// Time only advances through `advance` or `set_time`.
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `initial_time`
    pub fn new(initial_time: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time),
        })
    }

    /// Create a clock frozen at the current wall time
    pub fn starting_now() -> Arc<Self> {
        Self::new(Utc::now())
    }

    /// Advance the clock by a duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.write();
        *current += duration;
    }

    /// Explicitly set the time
    ///
    /// Moving backwards is allowed; callers that need monotonic time must
    /// not do it.
    pub fn set_time(&self, time: Timestamp) {
        *self.current_time.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }

    fn name(&self) -> &str {
        "manual"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::starting_now();

        let time1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let time2 = clock.now();
        assert_eq!(time1, time2);

        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now() - time1, Duration::seconds(5));
    }

    #[test]
    fn test_set_time() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let later = start + Duration::minutes(1);

        clock.set_time(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_since_never_negative() {
        let clock = ManualClock::starting_now();
        let start = clock.now();

        clock.advance(Duration::milliseconds(1_500));
        assert_eq!(clock.since(start), Duration::milliseconds(1_500));
        assert_eq!(clock.since(clock.now() + Duration::seconds(1)), Duration::zero());
    }
}
