use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
    /// Sell borrowed shares; needs a locate before routing
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
            Side::Short => "short",
        }
    }

    /// True for sides that reduce or invert a position
    pub fn is_sell(&self) -> bool {
        matches!(self, Side::Sell | Side::Short)
    }
}
