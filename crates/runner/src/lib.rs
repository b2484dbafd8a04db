//! Hermes Runner
//!
//! Assembles a runnable engine server for the `hermes-server` binary:
//!
//! - **Bootstrap**: broker, clock, engine server and simulated providers
//!   built from an `EngineConfig`
//! - **Quote feed**: random-walk reference prices and periodic quotes for
//!   every subscribed symbol, so clients see live ticks without a vendor

pub mod bootstrap;
pub mod quote_feed;

pub use bootstrap::{DEFAULT_PROVIDER, EngineBootstrap};
pub use quote_feed::{QuoteFeed, QuoteFeedConfig};
