use serde::{Deserialize, Serialize};

use crate::values::{ApplicationId, Timestamp};

/// Keep-alive sent by an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub app_id: ApplicationId,
    pub timestamp: Timestamp,
}

/// Keep-alive acknowledgement sent back to an active application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub app_id: ApplicationId,
    pub timestamp: Timestamp,
}

impl Heartbeat {
    pub fn new(app_id: impl Into<ApplicationId>, timestamp: Timestamp) -> Self {
        Self {
            app_id: app_id.into(),
            timestamp,
        }
    }
}
