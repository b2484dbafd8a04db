use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use hermes_core::Timestamp;
use hermes_ports::Clock;

/// Wall-clock time that never runs backwards
///
/// Heartbeat records only move forward, so a wall-clock step back (NTP
/// correction) would otherwise make fresh keep-alives look stale. Readings
/// are clamped to the latest one handed out.
#[derive(Debug, Default)]
pub struct SystemClock {
    latest_nanos: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn clamp(&self, reading: Timestamp) -> Timestamp {
        // Outside i64 nanoseconds (before 1677 or after 2262) readings pass through
        let Some(nanos) = reading.timestamp_nanos_opt() else {
            return reading;
        };
        let previous = self.latest_nanos.fetch_max(nanos, Ordering::AcqRel);
        if previous > nanos {
            DateTime::from_timestamp_nanos(previous)
        } else {
            reading
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.clamp(Utc::now())
    }

    fn name(&self) -> &str {
        "system"
    }
}
