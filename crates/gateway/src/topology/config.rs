//! Topology configuration

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::messages::InboundKind;
use crate::transport::ExchangeKind;

/// Logical routing key names
///
/// Request queues are named `{prefix}.{kind}` and bound with the same
/// routing key, e.g. `md.subscribe` or `oe.market_order`.
pub struct RoutingKeys;

impl RoutingKeys {
    /// Prefix for market data engine queues
    pub const MARKET_DATA_PREFIX: &'static str = "md";

    /// Prefix for order execution engine queues
    pub const ORDER_EXECUTION_PREFIX: &'static str = "oe";

    /// Default exchange shared by engines and client applications
    pub const DEFAULT_EXCHANGE: &'static str = "hermes";

    /// Request queue / routing key for a kind: `md.login`
    pub fn request(prefix: &str, kind: InboundKind) -> String {
        format!("{}.{}", prefix, kind)
    }
}

/// Queue name and the routing key it is bound with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueBinding {
    pub queue: String,
    pub routing_key: String,
}

impl QueueBinding {
    pub fn new(queue: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            routing_key: routing_key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub exchange: String,
    #[serde(default)]
    pub exchange_kind: ExchangeKind,
    #[serde(default)]
    pub queues: BTreeMap<InboundKind, QueueBinding>,
}

impl TopologyConfig {
    /// Exchange with no queues declared yet
    pub fn new(exchange: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            exchange_kind: ExchangeKind::Direct,
            queues: BTreeMap::new(),
        }
    }

    /// One `{prefix}.{kind}` queue per kind
    pub fn for_kinds(exchange: impl Into<String>, prefix: &str, kinds: &[InboundKind]) -> Self {
        kinds.iter().fold(Self::new(exchange), |config, &kind| {
            let name = RoutingKeys::request(prefix, kind);
            config.with_queue(kind, name.clone(), name)
        })
    }

    pub fn market_data(exchange: impl Into<String>) -> Self {
        Self::for_kinds(
            exchange,
            RoutingKeys::MARKET_DATA_PREFIX,
            &InboundKind::MARKET_DATA,
        )
    }

    pub fn order_execution(exchange: impl Into<String>) -> Self {
        Self::for_kinds(
            exchange,
            RoutingKeys::ORDER_EXECUTION_PREFIX,
            &InboundKind::ORDER_EXECUTION,
        )
    }

    pub fn with_queue(
        mut self,
        kind: InboundKind,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        self.queues.insert(kind, QueueBinding::new(queue, routing_key));
        self
    }

    pub fn binding(&self, kind: InboundKind) -> Option<&QueueBinding> {
        self.queues.get(&kind)
    }

    /// Routing key clients publish `kind` requests with
    pub fn routing_key(&self, kind: InboundKind) -> Option<&str> {
        self.binding(kind).map(|b| b.routing_key.as_str())
    }

    pub fn kinds(&self) -> impl Iterator<Item = InboundKind> + '_ {
        self.queues.keys().copied()
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.exchange.trim().is_empty() {
            return Err(GatewayError::InvalidTopology(
                "exchange name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (kind, binding) in &self.queues {
            if binding.queue.trim().is_empty() {
                return Err(GatewayError::InvalidTopology(format!(
                    "queue name for {} must not be empty",
                    kind
                )));
            }
            if !seen.insert(binding.queue.as_str()) {
                return Err(GatewayError::InvalidTopology(format!(
                    "queue '{}' is configured for more than one request kind",
                    binding.queue
                )));
            }
        }
        Ok(())
    }
}
