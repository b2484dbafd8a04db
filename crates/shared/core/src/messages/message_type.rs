use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of outbound message an application can receive
///
/// An application declares one reply routing key per class in its
/// `AppInfo` handshake. Classes it never declares are simply not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageType {
    /// Logon/logout notifications, inquiry responses, heartbeats
    Admin,
    Tick,
    LiveBar,
    HistoricBar,
    /// Order acknowledgements and cancellations
    Order,
    Execution,
    Rejection,
    /// Short-sell locate requests
    Locate,
}

impl MessageType {
    /// Every message class, in declaration order
    pub const ALL: [MessageType; 8] = [
        MessageType::Admin,
        MessageType::Tick,
        MessageType::LiveBar,
        MessageType::HistoricBar,
        MessageType::Order,
        MessageType::Execution,
        MessageType::Rejection,
        MessageType::Locate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Tick => "tick",
            Self::LiveBar => "live_bar",
            Self::HistoricBar => "historic_bar",
            Self::Order => "order",
            Self::Execution => "execution",
            Self::Rejection => "rejection",
            Self::Locate => "locate",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_classes_are_distinct() {
        let unique: HashSet<_> = MessageType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(unique.len(), MessageType::ALL.len());
    }
}
