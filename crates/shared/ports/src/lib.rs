//! Hermes Ports
//!
//! Port definitions (traits) for the Hermes engine servers.
//! These define the boundaries between the routing core and the
//! vendor integrations that feed it.

mod clock;
mod error;
mod provider;

pub use clock::Clock;
pub use error::{ProviderError, ProviderResult};
pub use provider::{ProviderAdapter, ProviderEvents};
