use serde::{Deserialize, Serialize};

use crate::values::ApplicationId;

/// Kinds of inquiry an application can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InquiryType {
    /// Ask the server for a fresh application id
    AppId,
    /// Tell the server the application is going away
    DisconnectClient,
    /// List the providers available on this engine
    Providers,
}

/// Inquiry request
///
/// `app_id` is absent for an `AppId` inquiry, since the application does
/// not have one yet; the reply then goes to `reply_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub inquiry: InquiryType,
    #[serde(default)]
    pub app_id: Option<ApplicationId>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl Inquiry {
    pub fn app_id(reply_to: impl Into<String>) -> Self {
        Self {
            inquiry: InquiryType::AppId,
            app_id: None,
            reply_to: Some(reply_to.into()),
        }
    }

    pub fn disconnect(app_id: impl Into<ApplicationId>) -> Self {
        Self {
            inquiry: InquiryType::DisconnectClient,
            app_id: Some(app_id.into()),
            reply_to: None,
        }
    }

    pub fn providers(app_id: impl Into<ApplicationId>) -> Self {
        Self {
            inquiry: InquiryType::Providers,
            app_id: Some(app_id.into()),
            reply_to: None,
        }
    }
}

/// Reply to an inquiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryResponse {
    pub inquiry: InquiryType,
    #[serde(default)]
    pub app_id: Option<ApplicationId>,
    #[serde(default)]
    pub providers: Vec<String>,
}

impl InquiryResponse {
    pub fn app_id(app_id: ApplicationId) -> Self {
        Self {
            inquiry: InquiryType::AppId,
            app_id: Some(app_id),
            providers: Vec::new(),
        }
    }

    pub fn providers(app_id: ApplicationId, providers: Vec<String>) -> Self {
        Self {
            inquiry: InquiryType::Providers,
            app_id: Some(app_id),
            providers,
        }
    }
}
