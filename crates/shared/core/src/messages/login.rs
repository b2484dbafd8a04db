use serde::{Deserialize, Serialize};

use crate::values::ApplicationId;

/// Request to log in to a provider; echoed back once the provider is connected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    pub app_id: ApplicationId,
    pub provider: String,
}

/// Request to log out of a provider; echoed back once the provider has disconnected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logout {
    pub app_id: ApplicationId,
    pub provider: String,
}

impl Login {
    pub fn new(app_id: impl Into<ApplicationId>, provider: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            provider: provider.into(),
        }
    }
}

impl Logout {
    pub fn new(app_id: impl Into<ApplicationId>, provider: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            provider: provider.into(),
        }
    }
}
