//! 台账业务说明标签

use serde::{Deserialize, Serialize};

/// 台账业务说明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerReason {
    Order,
    Withdrawal,
    Receipt,
    Adjustment,
    Transfer,
    Return,
}

impl LedgerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerReason::Order => "ORDER",
            LedgerReason::Withdrawal => "WITHDRAWAL",
            LedgerReason::Receipt => "RECEIPT",
            LedgerReason::Adjustment => "ADJUSTMENT",
            LedgerReason::Transfer => "TRANSFER",
            LedgerReason::Return => "RETURN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let reason = match value {
            "ORDER" => LedgerReason::Order,
            "WITHDRAWAL" => LedgerReason::Withdrawal,
            "RECEIPT" => LedgerReason::Receipt,
            "ADJUSTMENT" => LedgerReason::Adjustment,
            "TRANSFER" => LedgerReason::Transfer,
            "RETURN" => LedgerReason::Return,
            _ => return None,
        };
        Some(reason)
    }
}

impl std::fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
