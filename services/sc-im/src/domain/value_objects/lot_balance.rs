//! 批次余额快照

use serde::{Deserialize, Serialize};

/// 台账分录记录的 (quantity, reserve) 快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LotBalance {
    pub quantity: i64,
    pub reserve: i64,
}

impl LotBalance {
    pub const ZERO: LotBalance = LotBalance {
        quantity: 0,
        reserve: 0,
    };

    pub fn new(quantity: i64, reserve: i64) -> Self {
        Self { quantity, reserve }
    }
}

impl std::fmt::Display for LotBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.quantity, self.reserve)
    }
}
