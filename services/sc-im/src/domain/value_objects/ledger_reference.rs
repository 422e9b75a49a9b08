//! 台账分录的触发来源

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdjustmentId, DemandLineId, ReceiptId, ReturnId, TransferId, WithdrawalId};

/// 触发库存变动的业务单据，只作查找用途，不拥有对方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum LedgerReference {
    /// 需求行预留，订单与延期订单都记在需求行名下
    DemandLine(DemandLineId),
    /// 领料
    Withdrawal(WithdrawalId),
    /// 入库
    Receipt(ReceiptId),
    /// 盘点调整
    Adjustment(AdjustmentId),
    /// 调拨
    Transfer(TransferId),
    /// 退料
    Return(ReturnId),
}

impl LedgerReference {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerReference::DemandLine(_) => "DEMAND_LINE",
            LedgerReference::Withdrawal(_) => "WITHDRAWAL",
            LedgerReference::Receipt(_) => "RECEIPT",
            LedgerReference::Adjustment(_) => "ADJUSTMENT",
            LedgerReference::Transfer(_) => "TRANSFER",
            LedgerReference::Return(_) => "RETURN",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            LedgerReference::DemandLine(id) => id.0,
            LedgerReference::Withdrawal(id) => id.0,
            LedgerReference::Receipt(id) => id.0,
            LedgerReference::Adjustment(id) => id.0,
            LedgerReference::Transfer(id) => id.0,
            LedgerReference::Return(id) => id.0,
        }
    }

    /// 由持久化的 (kind, id) 还原
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        let reference = match kind {
            "DEMAND_LINE" => LedgerReference::DemandLine(id.into()),
            "WITHDRAWAL" => LedgerReference::Withdrawal(id.into()),
            "RECEIPT" => LedgerReference::Receipt(id.into()),
            "ADJUSTMENT" => LedgerReference::Adjustment(id.into()),
            "TRANSFER" => LedgerReference::Transfer(id.into()),
            "RETURN" => LedgerReference::Return(id.into()),
            _ => return None,
        };
        Some(reference)
    }
}
