//! Hermes Session
//!
//! Per-application state an engine server keeps for its clients:
//! - `RoutingDirectory`: reply routing keys announced in `AppInfo`
//! - `HeartbeatMonitor`: liveness tracking, keep-alive replies and eviction
//! - `AppIdGenerator`: collision-free application ids
//!
//! Both maps are concurrent; they are written from queue consumer tasks and
//! read from provider callback threads at the same time.

pub mod directory;
pub mod error;
pub mod heartbeat;
pub mod ids;

pub use directory::RoutingDirectory;
pub use error::{Result, SessionError};
pub use heartbeat::{HeartbeatConfig, HeartbeatListener, HeartbeatMonitor, TickOutcome};
pub use ids::AppIdGenerator;
