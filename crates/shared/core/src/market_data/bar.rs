use serde::{Deserialize, Serialize};

use crate::values::{ApplicationId, Price, Quantity, Symbol, Timestamp};

/// OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub provider: String,
    pub symbol: Symbol,
    /// Bar length in seconds
    pub bar_seconds: u32,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Quantity,
    /// Bar close time
    pub timestamp: Timestamp,
}

/// Request for a range of historic bars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricBarRequest {
    /// Client chosen id, echoed in the `HistoricBarData` reply
    pub request_id: String,
    pub app_id: ApplicationId,
    pub provider: String,
    pub symbol: Symbol,
    pub bar_seconds: u32,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Reply to a `HistoricBarRequest`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricBarData {
    pub request_id: String,
    pub provider: String,
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
}

impl Bar {
    /// True if the bar's prices are internally consistent
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn bar(open: Price, high: Price, low: Price, close: Price) -> Bar {
        Bar {
            provider: "Simulated".to_string(),
            symbol: "MSFT".to_string(),
            bar_seconds: 60,
            open,
            high,
            low,
            close,
            volume: dec!(1000),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_bar_consistency() {
        assert!(bar(dec!(10), dec!(12), dec!(9), dec!(11)).is_consistent());
        assert!(!bar(dec!(10), dec!(9), dec!(12), dec!(11)).is_consistent());
    }
}
