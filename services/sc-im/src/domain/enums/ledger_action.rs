//! 台账动作（变动原因标签）

use serde::{Deserialize, Serialize};

/// 分录的增减量作用在哪个计数器上
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceComponent {
    Quantity,
    Reserve,
}

/// 台账动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAction {
    /// 预留
    Reserve,
    /// 释放预留
    ReserveBack,
    /// 领用出库
    Withdraw,
    /// 入库
    Incoming,
    /// 调入
    TransferIn,
    /// 调出
    TransferOut,
    /// 盘点调整
    Adjust,
}

impl LedgerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerAction::Reserve => "RESERVE",
            LedgerAction::ReserveBack => "RESERVE_BACK",
            LedgerAction::Withdraw => "WITHDRAW",
            LedgerAction::Incoming => "INCOMING",
            LedgerAction::TransferIn => "TRANSFER_IN",
            LedgerAction::TransferOut => "TRANSFER_OUT",
            LedgerAction::Adjust => "ADJUST",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let action = match value {
            "RESERVE" => LedgerAction::Reserve,
            "RESERVE_BACK" => LedgerAction::ReserveBack,
            "WITHDRAW" => LedgerAction::Withdraw,
            "INCOMING" => LedgerAction::Incoming,
            "TRANSFER_IN" => LedgerAction::TransferIn,
            "TRANSFER_OUT" => LedgerAction::TransferOut,
            "ADJUST" => LedgerAction::Adjust,
            _ => return None,
        };
        Some(action)
    }

    /// 预留类动作改动 reserve，其余改动 quantity
    pub fn affects(&self) -> BalanceComponent {
        match self {
            LedgerAction::Reserve | LedgerAction::ReserveBack | LedgerAction::Withdraw => {
                BalanceComponent::Reserve
            }
            LedgerAction::Incoming
            | LedgerAction::TransferIn
            | LedgerAction::TransferOut
            | LedgerAction::Adjust => BalanceComponent::Quantity,
        }
    }
}

impl std::fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
