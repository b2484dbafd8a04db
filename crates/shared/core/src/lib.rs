//! Hermes Core Domain
//!
//! Pure domain types shared by the engine servers and their client
//! applications. This crate contains no async, no I/O, and is 100% unit
//! testable.
//!
//! - `values`: identifiers and scalar aliases (`ApplicationId`, `Timestamp`)
//! - `messages`: the control-plane vocabulary (login, subscribe, inquiry, app info)
//! - `market_data`: ticks and bars produced by market data providers
//! - `entities`: order flow (orders, executions, rejections, locates, positions)
//! - `events`: the `DomainEvent` union routed back to client applications

pub mod entities;
pub mod events;
pub mod market_data;
pub mod messages;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    CancelOrder, Execution, LocateOrder, LocateResponse, Order, OrderId, OrderStatus, OrderType,
    Position, Rejection, RejectionKind, Side,
};
pub use events::DomainEvent;
pub use market_data::{Bar, HistoricBarData, HistoricBarRequest, Tick};
pub use messages::{
    AppInfo, Heartbeat, HeartbeatResponse, Inquiry, InquiryResponse, InquiryType, Login, Logout,
    MessageType, Subscribe, SubscriptionKind, Unsubscribe,
};
pub use values::{ApplicationId, Price, Quantity, Symbol, Timestamp};
