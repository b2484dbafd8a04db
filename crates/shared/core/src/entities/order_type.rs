use serde::{Deserialize, Serialize};

/// Type of order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at the best available price
    Market,
    /// Execute at the limit price or better
    Limit,
}
