//! Payload encoding
//!
//! The engine treats payloads as opaque bytes; a `MessageCodec` is the only
//! place that knows the wire format. Requests are encoded as the bare
//! message for their kind. Events are encoded as the tagged `DomainEvent`.

use hermes_core::DomainEvent;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::GatewayError;
use crate::messages::inbound::{InboundKind, InboundRequest};

pub trait MessageCodec: Send + Sync {
    fn encode_event(&self, event: &DomainEvent) -> Result<Vec<u8>, GatewayError>;

    fn decode_event(&self, payload: &[u8]) -> Result<DomainEvent, GatewayError>;

    fn encode_request(&self, request: &InboundRequest) -> Result<Vec<u8>, GatewayError>;

    /// Decode a delivery taken from the queue for `kind`
    fn decode_request(
        &self,
        kind: InboundKind,
        payload: &[u8],
    ) -> Result<InboundRequest, GatewayError>;
}

/// JSON wire format via serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }

    fn encode<T: Serialize>(message: &str, value: &T) -> Result<Vec<u8>, GatewayError> {
        serde_json::to_vec(value).map_err(|e| GatewayError::Encode {
            message: message.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(kind: InboundKind, payload: &[u8]) -> Result<T, GatewayError> {
        serde_json::from_slice(payload).map_err(|e| GatewayError::Decode {
            kind,
            reason: e.to_string(),
        })
    }
}

impl MessageCodec for JsonCodec {
    fn encode_event(&self, event: &DomainEvent) -> Result<Vec<u8>, GatewayError> {
        Self::encode(event.name(), event)
    }

    fn decode_event(&self, payload: &[u8]) -> Result<DomainEvent, GatewayError> {
        serde_json::from_slice(payload).map_err(|e| GatewayError::EventDecode(e.to_string()))
    }

    fn encode_request(&self, request: &InboundRequest) -> Result<Vec<u8>, GatewayError> {
        let message = request.kind().as_str();
        match request {
            InboundRequest::Login(m) => Self::encode(message, m),
            InboundRequest::Logout(m) => Self::encode(message, m),
            InboundRequest::Subscribe(m) => Self::encode(message, m),
            InboundRequest::Unsubscribe(m) => Self::encode(message, m),
            InboundRequest::HistoricBars(m) => Self::encode(message, m),
            InboundRequest::MarketOrder(m) | InboundRequest::LimitOrder(m) => {
                Self::encode(message, m)
            }
            InboundRequest::CancelOrder(m) => Self::encode(message, m),
            InboundRequest::LocateResponse(m) => Self::encode(message, m),
            InboundRequest::Inquiry(m) => Self::encode(message, m),
            InboundRequest::AppInfo(m) => Self::encode(message, m),
            InboundRequest::Heartbeat(m) => Self::encode(message, m),
        }
    }

    fn decode_request(
        &self,
        kind: InboundKind,
        payload: &[u8],
    ) -> Result<InboundRequest, GatewayError> {
        let request = match kind {
            InboundKind::Login => InboundRequest::Login(Self::decode(kind, payload)?),
            InboundKind::Logout => InboundRequest::Logout(Self::decode(kind, payload)?),
            InboundKind::Subscribe => InboundRequest::Subscribe(Self::decode(kind, payload)?),
            InboundKind::Unsubscribe => InboundRequest::Unsubscribe(Self::decode(kind, payload)?),
            InboundKind::HistoricBars => {
                InboundRequest::HistoricBars(Self::decode(kind, payload)?)
            }
            InboundKind::MarketOrder => InboundRequest::MarketOrder(Self::decode(kind, payload)?),
            InboundKind::LimitOrder => InboundRequest::LimitOrder(Self::decode(kind, payload)?),
            InboundKind::CancelOrder => InboundRequest::CancelOrder(Self::decode(kind, payload)?),
            InboundKind::LocateResponse => {
                InboundRequest::LocateResponse(Self::decode(kind, payload)?)
            }
            InboundKind::Inquiry => InboundRequest::Inquiry(Self::decode(kind, payload)?),
            InboundKind::AppInfo => InboundRequest::AppInfo(Self::decode(kind, payload)?),
            InboundKind::Heartbeat => InboundRequest::Heartbeat(Self::decode(kind, payload)?),
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hermes_core::{AppInfo, MessageType, Order, Side, Tick};
    use rust_decimal_macros::dec;

    #[test]
    fn test_app_info_request_decodes_from_queue_kind() {
        let codec = JsonCodec::new();
        let request = InboundRequest::AppInfo(
            AppInfo::new("X123")
                .with_destination(MessageType::Admin, "A")
                .with_destination(MessageType::Tick, "B"),
        );

        let bytes = codec.encode_request(&request).unwrap();
        let decoded = codec.decode_request(InboundKind::AppInfo, &bytes).unwrap();

        assert_eq!(decoded, request);
    }

    #[test]
    fn test_order_kinds_share_payload_shape() {
        let codec = JsonCodec::new();
        let order = Order::limit("app", "Sim", "AAPL", Side::Buy, dec!(10), dec!(150.25));
        let bytes = codec
            .encode_request(&InboundRequest::LimitOrder(order.clone()))
            .unwrap();

        // The queue, not the payload, decides the variant
        let decoded = codec.decode_request(InboundKind::LimitOrder, &bytes).unwrap();
        assert_eq!(decoded, InboundRequest::LimitOrder(order));
    }

    #[test]
    fn test_malformed_payload_reports_kind() {
        let codec = JsonCodec::new();

        let err = codec
            .decode_request(InboundKind::Subscribe, b"{not json")
            .unwrap_err();

        match err {
            GatewayError::Decode { kind, .. } => assert_eq!(kind, InboundKind::Subscribe),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_shape_for_kind_is_rejected() {
        let codec = JsonCodec::new();
        let login = codec
            .encode_request(&InboundRequest::Login(hermes_core::Login::new("a", "Sim")))
            .unwrap();

        assert!(codec.decode_request(InboundKind::Heartbeat, &login).is_err());
    }

    #[test]
    fn test_event_keeps_decimal_precision() {
        let codec = JsonCodec::new();
        let tick = Tick::quote(
            "Sim",
            "AAPL",
            dec!(101.125),
            dec!(300),
            dec!(101.130),
            dec!(200),
            Utc::now(),
        );
        let event = DomainEvent::Tick(tick);

        let bytes = codec.encode_event(&event).unwrap();
        assert_eq!(codec.decode_event(&bytes).unwrap(), event);
    }
}
