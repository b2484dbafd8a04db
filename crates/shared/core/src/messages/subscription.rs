use serde::{Deserialize, Serialize};

use crate::values::{ApplicationId, Symbol};

/// What an application wants to receive for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionKind {
    /// Quote and trade ticks
    Tick,
    /// Live bars of the given length
    LiveBar { bar_seconds: u32 },
}

/// Market data subscription request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscribe {
    pub app_id: ApplicationId,
    pub provider: String,
    pub symbol: Symbol,
    pub kind: SubscriptionKind,
}

/// Market data unsubscription request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unsubscribe {
    pub app_id: ApplicationId,
    pub provider: String,
    pub symbol: Symbol,
    pub kind: SubscriptionKind,
}

impl Subscribe {
    pub fn ticks(
        app_id: impl Into<ApplicationId>,
        provider: impl Into<String>,
        symbol: impl Into<Symbol>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            provider: provider.into(),
            symbol: symbol.into(),
            kind: SubscriptionKind::Tick,
        }
    }

    pub fn live_bars(
        app_id: impl Into<ApplicationId>,
        provider: impl Into<String>,
        symbol: impl Into<Symbol>,
        bar_seconds: u32,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            provider: provider.into(),
            symbol: symbol.into(),
            kind: SubscriptionKind::LiveBar { bar_seconds },
        }
    }

    /// The matching unsubscribe request
    pub fn to_unsubscribe(&self) -> Unsubscribe {
        Unsubscribe {
            app_id: self.app_id.clone(),
            provider: self.provider.clone(),
            symbol: self.symbol.clone(),
            kind: self.kind,
        }
    }
}

impl Unsubscribe {
    /// The subscription this request cancels
    pub fn to_subscribe(&self) -> Subscribe {
        Subscribe {
            app_id: self.app_id.clone(),
            provider: self.provider.clone(),
            symbol: self.symbol.clone(),
            kind: self.kind,
        }
    }
}
