//! Hermes Clock Infrastructure
//!
//! Provides time sources for production and tests:
//!
//! - `SystemClock`: wall-clock time
//! - `ManualClock`: frozen time that only moves when told to, so heartbeat
//!   expiry can be tested without sleeping
//!
//! ## Usage
//!
//! ```ignore
//! use hermes_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(start);
//! clock.advance(Duration::milliseconds(6000));
//! assert_eq!(clock.now() - start, Duration::milliseconds(6000));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use hermes_ports::Clock;
