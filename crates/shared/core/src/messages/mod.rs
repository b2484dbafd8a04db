//! Control-plane message vocabulary
//!
//! These are the messages a client application exchanges with an engine
//! server to manage its session: announcing itself, logging in to providers,
//! subscribing to data, asking inquiries and keeping the session alive.

mod app_info;
mod heartbeat;
mod inquiry;
mod login;
mod message_type;
mod subscription;

pub use app_info::AppInfo;
pub use heartbeat::{Heartbeat, HeartbeatResponse};
pub use inquiry::{Inquiry, InquiryResponse, InquiryType};
pub use login::{Login, Logout};
pub use message_type::MessageType;
pub use subscription::{Subscribe, SubscriptionKind, Unsubscribe};
