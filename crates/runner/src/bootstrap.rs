//! Bootstrap - engine server assembly
//!
//! Wires an `EngineServer` to an in-process broker and registers one
//! `SimulatedProvider` per configured provider name.

use std::sync::Arc;

use hermes_clock::SystemClock;
use hermes_engine::{EngineConfig, EngineServer, Result, SimulatedProvider};
use hermes_gateway::{InMemoryBroker, MessageBroker};
use hermes_ports::{Clock, ProviderAdapter};
use log::info;

/// Provider registered when the config names none
pub const DEFAULT_PROVIDER: &str = "Simulated";

pub struct EngineBootstrap {
    pub server: EngineServer,
    pub broker: Arc<InMemoryBroker>,
    pub providers: Vec<Arc<SimulatedProvider>>,
}

impl EngineBootstrap {
    /// Build on the wall clock
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(mut config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.providers.is_empty() {
            config.providers.push(DEFAULT_PROVIDER.to_string());
        }
        let names = config.providers.clone();

        let broker = Arc::new(InMemoryBroker::new());
        let server = EngineServer::new(
            config,
            Arc::clone(&broker) as Arc<dyn MessageBroker>,
            Arc::clone(&clock),
        )?;

        let mut providers = Vec::with_capacity(names.len());
        for name in names {
            let provider = Arc::new(SimulatedProvider::new(name, Arc::clone(&clock)));
            server.add_provider(provider.clone())?;
            providers.push(provider);
        }
        info!(
            "Bootstrapped '{}' with {} simulated providers",
            server.config().name,
            providers.len()
        );

        Ok(Self {
            server,
            broker,
            providers,
        })
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<SimulatedProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_engine::{EngineError, EngineKind};

    #[test]
    fn test_default_provider_when_none_configured() {
        let bootstrap = EngineBootstrap::with_config(EngineConfig::default()).unwrap();

        assert_eq!(bootstrap.providers.len(), 1);
        assert!(bootstrap.provider(DEFAULT_PROVIDER).is_some());
        assert_eq!(
            bootstrap.server.controller().provider_names(),
            vec![DEFAULT_PROVIDER.to_string()]
        );
    }

    #[test]
    fn test_configured_providers_are_registered() {
        let config = EngineConfig::for_kind(EngineKind::OrderExecution)
            .with_provider("Alpha")
            .with_provider("Beta");

        let bootstrap = EngineBootstrap::with_config(config).unwrap();

        assert_eq!(
            bootstrap.server.controller().provider_names(),
            vec!["Alpha".to_string(), "Beta".to_string()]
        );
    }

    #[test]
    fn test_duplicate_provider_names_fail() {
        let config = EngineConfig::default()
            .with_provider("Alpha")
            .with_provider("Alpha");

        assert!(matches!(
            EngineBootstrap::with_config(config),
            Err(EngineError::DuplicateProvider(name)) if name == "Alpha"
        ));
    }
}
