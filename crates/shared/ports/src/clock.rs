use chrono::Duration;
use hermes_core::Timestamp;

/// Source of "now" for heartbeat expiry and event timestamps
///
/// Engines run on the system clock; tests swap in a manual one and move it
/// explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Short label for logs
    fn name(&self) -> &str {
        "clock"
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    fn since(&self, earlier: Timestamp) -> Duration {
        (self.now() - earlier).max(Duration::zero())
    }
}
