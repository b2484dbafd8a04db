use hermes_core::{ApplicationId, MessageType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Application id must not be empty")]
    EmptyApplicationId,

    #[error("Invalid heartbeat configuration: {0}")]
    InvalidHeartbeatConfig(String),

    #[error("A heartbeat listener is already attached")]
    ListenerAlreadyAttached,

    #[error("No {message_type} destination registered for application {app_id}")]
    NoDestination {
        app_id: ApplicationId,
        message_type: MessageType,
    },

    #[error("Publish failed: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
