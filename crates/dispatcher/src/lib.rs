//! Hermes Dispatcher
//!
//! Decouples the hot publish path from a broker's synchronous API.
//!
//! Producers (tick and bar callbacks, order acknowledgements) claim a slot in
//! a fixed-size ring, write a destination and payload into it, and publish
//! it. A single consumer thread drains published slots in strictly
//! increasing sequence order and hands each one to the broker.
//!
//! ```text
//!  producer A ─┐  claim / publish
//!  producer B ─┼──────────────────▶ ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!  producer C ─┘                    │ 0 │ 1 │ 2 │ 3 │ 4 │ 5 │ 6 │ 7 │
//!                                   └───┴───┴───┴───┴───┴───┴───┴───┘
//!                                                 │ contiguous batches
//!                                                 ▼
//!                                     consumer thread ──▶ broker.publish()
//! ```
//!
//! Claiming is the only operation that can block a producer, and only while
//! the ring is full. A failed or panicking publish is logged and skipped.

mod dispatcher;
mod error;
mod request;
mod ring;

pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherStats};
pub use error::{DispatcherError, Result};
pub use request::CorrelatedRequest;
pub use ring::{ClaimedSlot, RingBuffer};
