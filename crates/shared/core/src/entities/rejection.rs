use serde::{Deserialize, Serialize};

use super::OrderId;
use crate::values::Timestamp;

/// What the provider refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// The order itself; it never reached the venue's book
    #[default]
    Order,
    /// A cancel request; the order may still be working
    Cancel,
}

/// Order rejection reported by an execution provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub order_id: OrderId,
    pub provider: String,
    pub reason: String,
    #[serde(default)]
    pub kind: RejectionKind,
    pub timestamp: Timestamp,
}

impl Rejection {
    /// Whether the order is finished once this rejection arrives
    pub fn is_terminal(&self) -> bool {
        self.kind == RejectionKind::Order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_kind_defaults_to_order_on_the_wire() {
        let json = format!(
            r#"{{"order_id":"{}","provider":"Sim","reason":"x","timestamp":"{}"}}"#,
            Uuid::new_v4(),
            Utc::now().to_rfc3339()
        );
        let rejection: Rejection = serde_json::from_str(&json).unwrap();

        assert_eq!(rejection.kind, RejectionKind::Order);
        assert!(rejection.is_terminal());
    }

    #[test]
    fn test_cancel_rejection_is_not_terminal() {
        let rejection = Rejection {
            order_id: Uuid::new_v4(),
            provider: "Sim".to_string(),
            reason: "too late".to_string(),
            kind: RejectionKind::Cancel,
            timestamp: Utc::now(),
        };
        assert!(!rejection.is_terminal());
    }
}
