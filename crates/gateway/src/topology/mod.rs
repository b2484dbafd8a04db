//! Broker topology for one engine server

pub mod config;
pub mod manager;

pub use config::{QueueBinding, RoutingKeys, TopologyConfig};
pub use manager::{QueueTopologyManager, RequestHandler};
