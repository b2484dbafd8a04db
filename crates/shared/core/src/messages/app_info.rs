use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::MessageType;
use crate::values::ApplicationId;

/// Handshake an application sends after obtaining its id
///
/// Carries the reply routing key the application listens on for each
/// message class. Resending it overwrites the previous set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_id: ApplicationId,
    #[serde(default)]
    pub destinations: HashMap<MessageType, String>,
}

impl AppInfo {
    pub fn new(app_id: impl Into<ApplicationId>) -> Self {
        Self {
            app_id: app_id.into(),
            destinations: HashMap::new(),
        }
    }

    /// Declare the routing key for one message class
    pub fn with_destination(
        mut self,
        message_type: MessageType,
        routing_key: impl Into<String>,
    ) -> Self {
        self.destinations.insert(message_type, routing_key.into());
        self
    }
}
