use std::sync::Arc;

use hermes_core::{
    Bar, CancelOrder, Execution, HistoricBarData, HistoricBarRequest, LocateOrder,
    LocateResponse, Order, Position, Rejection, Subscribe, Tick, Unsubscribe,
};

use crate::error::{ProviderError, ProviderResult};

/// Port for a market data or order execution vendor integration
///
/// Commands flow in through this trait; the adapter reports results
/// asynchronously through the `ProviderEvents` listener attached to it.
pub trait ProviderAdapter: Send + Sync {
    /// Provider name used by clients to address it
    fn name(&self) -> &str;

    /// Attach the listener that receives this provider's events
    ///
    /// Only one listener may be attached; a second attach fails with
    /// `ProviderError::ListenerAlreadyAttached`.
    fn attach(&self, events: Arc<dyn ProviderEvents>) -> ProviderResult<()>;

    fn is_connected(&self) -> bool;

    fn login(&self) -> ProviderResult<()>;

    fn logout(&self) -> ProviderResult<()>;

    fn subscribe(&self, request: &Subscribe) -> ProviderResult<()> {
        let _ = request;
        Err(self.unsupported("subscribe"))
    }

    fn unsubscribe(&self, request: &Unsubscribe) -> ProviderResult<()> {
        let _ = request;
        Err(self.unsupported("unsubscribe"))
    }

    fn request_historic_bars(&self, request: &HistoricBarRequest) -> ProviderResult<()> {
        let _ = request;
        Err(self.unsupported("historic bars"))
    }

    fn send_market_order(&self, order: &Order) -> ProviderResult<()> {
        let _ = order;
        Err(self.unsupported("market order"))
    }

    fn send_limit_order(&self, order: &Order) -> ProviderResult<()> {
        let _ = order;
        Err(self.unsupported("limit order"))
    }

    fn cancel_order(&self, request: &CancelOrder) -> ProviderResult<()> {
        let _ = request;
        Err(self.unsupported("cancel order"))
    }

    fn send_locate_response(&self, response: &LocateResponse) -> ProviderResult<()> {
        let _ = response;
        Err(self.unsupported("locate response"))
    }

    /// Error for operations this provider does not offer
    fn unsupported(&self, operation: &str) -> ProviderError {
        ProviderError::Unsupported {
            provider: self.name().to_string(),
            operation: operation.to_string(),
        }
    }
}

/// Callbacks a provider adapter raises into the engine
///
/// Adapters call these from their own threads, concurrently.
pub trait ProviderEvents: Send + Sync {
    fn on_logon_arrived(&self, provider: &str);

    fn on_logout_arrived(&self, provider: &str);

    fn on_tick_arrived(&self, tick: Tick);

    fn on_bar_arrived(&self, bar: Bar);

    fn on_historic_data_arrived(&self, data: HistoricBarData);

    fn on_order_new(&self, order: Order);

    fn on_order_cancelled(&self, order: Order);

    fn on_order_executed(&self, execution: Execution);

    fn on_order_rejected(&self, rejection: Rejection);

    fn on_locate_arrived(&self, locate: LocateOrder);

    fn on_position_arrived(&self, position: Position);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct QuoteOnly;

    impl ProviderAdapter for QuoteOnly {
        fn name(&self) -> &str {
            "QuoteOnly"
        }

        fn attach(&self, _events: Arc<dyn ProviderEvents>) -> ProviderResult<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn login(&self) -> ProviderResult<()> {
            Ok(())
        }

        fn logout(&self) -> ProviderResult<()> {
            Ok(())
        }
    }

    // Ensure traits are object-safe
    fn _assert_adapter_object_safe(_: &dyn ProviderAdapter) {}
    fn _assert_events_object_safe(_: &dyn ProviderEvents) {}

    #[test]
    fn test_default_operations_are_unsupported() {
        let cancel = CancelOrder {
            order_id: uuid_stub(),
            app_id: "app".into(),
            provider: "QuoteOnly".to_string(),
        };

        match QuoteOnly.cancel_order(&cancel) {
            Err(ProviderError::Unsupported { provider, operation }) => {
                assert_eq!(provider, "QuoteOnly");
                assert_eq!(operation, "cancel order");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    fn uuid_stub() -> hermes_core::OrderId {
        hermes_core::OrderId::nil()
    }
}
