use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the execution provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Sent to the provider, no acknowledgement yet
    Submitted,
    /// Acknowledged by the provider
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Returns true if the order is still working
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Submitted | OrderStatus::New | OrderStatus::PartiallyFilled
        )
    }
}
