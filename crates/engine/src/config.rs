//! Engine configuration
//!
//! Loaded once at startup from a JSON file. Every field has a default, so an
//! empty object `{}` is a valid market data engine configuration:
//!
//! ```json
//! {
//!   "name": "hermes-md",
//!   "kind": "market_data",
//!   "exchange": "hermes",
//!   "heartbeat": { "threshold_ms": 5000, "interval_ms": 1000 },
//!   "ring_capacity": 1024,
//!   "providers": ["Simulated"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use hermes_dispatcher::DispatcherConfig;
use hermes_gateway::{ExchangeKind, InboundKind, QueueBinding, RoutingKeys, TopologyConfig};
use hermes_session::HeartbeatConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which family of requests an engine serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    MarketData,
    OrderExecution,
}

impl EngineKind {
    /// Parse the command-line spelling (`market-data`, `order-execution`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "market-data" | "md" => Some(Self::MarketData),
            "order-execution" | "oe" => Some(Self::OrderExecution),
            _ => None,
        }
    }

    /// Request kinds this engine consumes
    pub fn inbound_kinds(&self) -> &'static [InboundKind] {
        match self {
            Self::MarketData => &InboundKind::MARKET_DATA,
            Self::OrderExecution => &InboundKind::ORDER_EXECUTION,
        }
    }

    /// Queue and routing key prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::MarketData => RoutingKeys::MARKET_DATA_PREFIX,
            Self::OrderExecution => RoutingKeys::ORDER_EXECUTION_PREFIX,
        }
    }

    fn default_name(&self) -> &'static str {
        match self {
            Self::MarketData => "hermes-market-data",
            Self::OrderExecution => "hermes-order-execution",
        }
    }
}

/// Heartbeat settings in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatSettings {
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_threshold_ms() -> u64 {
    5_000
}

fn default_interval_ms() -> u64 {
    1_000
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            threshold_ms: default_threshold_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

/// Root configuration for one engine server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine name, used in logs
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kind: EngineKind,

    /// Exchange the request queues are bound to and replies are published on
    #[serde(default = "default_exchange")]
    pub exchange: String,

    #[serde(default)]
    pub exchange_kind: ExchangeKind,

    /// Per-kind queue overrides; kinds not listed get `{prefix}.{kind}`
    #[serde(default)]
    pub queues: BTreeMap<InboundKind, QueueBinding>,

    #[serde(default)]
    pub heartbeat: HeartbeatSettings,

    /// Dispatcher ring size, a power of two
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,

    /// Simulated providers to register at startup
    #[serde(default)]
    pub providers: Vec<String>,

    /// Fixed prefix for generated application ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id_prefix: Option<String>,
}

fn default_exchange() -> String {
    RoutingKeys::DEFAULT_EXCHANGE.to_string()
}

fn default_ring_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_kind(EngineKind::default())
    }
}

impl EngineConfig {
    /// Defaults for an engine of `kind`
    pub fn for_kind(kind: EngineKind) -> Self {
        Self {
            name: kind.default_name().to_string(),
            kind,
            exchange: default_exchange(),
            exchange_kind: ExchangeKind::Direct,
            queues: BTreeMap::new(),
            heartbeat: HeartbeatSettings::default(),
            ring_capacity: default_ring_capacity(),
            providers: Vec::new(),
            app_id_prefix: None,
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.name.trim().is_empty() {
            config.name = config.kind.default_name().to_string();
        }
        Ok(config)
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    pub fn with_heartbeat(mut self, threshold_ms: u64, interval_ms: u64) -> Self {
        self.heartbeat = HeartbeatSettings {
            threshold_ms,
            interval_ms,
        };
        self
    }

    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.providers.push(provider.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "exchange name must not be empty".to_string(),
            ));
        }
        if self.ring_capacity == 0 || !self.ring_capacity.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "ring capacity {} is not a power of two",
                self.ring_capacity
            )));
        }
        self.heartbeat_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let allowed = self.kind.inbound_kinds();
        if let Some(kind) = self.queues.keys().find(|kind| !allowed.contains(kind)) {
            return Err(ConfigError::Invalid(format!(
                "{:?} engine does not consume {} requests",
                self.kind, kind
            )));
        }
        self.topology()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Default queues for the engine kind with the configured overrides applied
    pub fn topology(&self) -> TopologyConfig {
        let mut topology = TopologyConfig::for_kinds(
            &self.exchange,
            self.kind.prefix(),
            self.kind.inbound_kinds(),
        );
        topology.exchange_kind = self.exchange_kind;
        for (kind, binding) in &self.queues {
            topology = topology.with_queue(*kind, &binding.queue, &binding.routing_key);
        }
        topology
    }

    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from_millis(self.heartbeat.threshold_ms, self.heartbeat.interval_ms)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            thread_name: format!("{}-dispatcher", self.name),
            ..DispatcherConfig::with_capacity(self.ring_capacity)
        }
    }
}
