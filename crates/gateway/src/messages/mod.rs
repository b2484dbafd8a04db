//! Wire-level message handling
//!
//! - `inbound`: the requests a client application sends to an engine
//! - `codec`: byte encoding of requests and outbound domain events

pub mod codec;
pub mod inbound;

pub use codec::{JsonCodec, MessageCodec};
pub use inbound::{InboundKind, InboundRequest};
