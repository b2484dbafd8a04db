//! Hermes Engine
//!
//! A Hermes engine server sits between client applications on a message
//! broker and one or more market data / order execution providers.
//!
//! ```text
//!   ┌─────────────────────────── EngineServer ───────────────────────────┐
//!   │                                                                    │
//!   │  QueueTopologyManager ──▶ EngineController ──▶ ProviderAdapter(s)  │
//!   │   (md.* / oe.* queues)        │      ▲              │              │
//!   │                               │      └── events ────┘              │
//!   │        HeartbeatMonitor ◀─────┤                                    │
//!   │        RoutingDirectory ◀─────┤                                    │
//!   │                               ▼                                    │
//!   │            control replies: publish_event (direct)                 │
//!   │            data-plane replies: Dispatcher ring ──▶ broker          │
//!   └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - `config`: `EngineConfig`, loaded from JSON
//! - `controller`: request handling and reply routing
//! - `server`: `EngineServer` start/stop lifecycle
//! - `adapters`: `SimulatedProvider` for running without a vendor

pub mod adapters;
pub mod config;
pub mod controller;
pub mod error;
pub mod server;

pub use adapters::SimulatedProvider;
pub use config::{EngineConfig, EngineKind, HeartbeatSettings};
pub use controller::{EngineController, SubscriptionKey};
pub use error::{ConfigError, EngineError, Result};
pub use server::{EngineServer, EngineStats};
