//! 入库建批命令

use cuba_cqrs_core::Command;
use cuba_domain_core::{Money, UserId};
use cuba_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{LedgerEntry, Lot};
use crate::domain::enums::{LedgerAction, LedgerReason};
use crate::domain::value_objects::{
    AdjustmentId, LedgerReference, LocationId, MaterialId, ReceiptId, TransferId,
};

/// 建批来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum InboundSource {
    /// 采购入库
    Receipt(ReceiptId),
    /// 盘盈调整
    Adjustment(AdjustmentId),
    /// 库间调入
    Transfer(TransferId),
}

impl InboundSource {
    /// 首条台账分录的动作与业务说明
    pub fn ledger_tags(&self) -> (LedgerAction, LedgerReason) {
        match self {
            InboundSource::Receipt(_) => (LedgerAction::Incoming, LedgerReason::Receipt),
            InboundSource::Adjustment(_) => (LedgerAction::Adjust, LedgerReason::Adjustment),
            InboundSource::Transfer(_) => (LedgerAction::TransferIn, LedgerReason::Transfer),
        }
    }

    pub fn reference(&self) -> LedgerReference {
        match self {
            InboundSource::Receipt(id) => LedgerReference::Receipt(*id),
            InboundSource::Adjustment(id) => LedgerReference::Adjustment(*id),
            InboundSource::Transfer(id) => LedgerReference::Transfer(*id),
        }
    }
}

/// 入库建批命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveStockCommand {
    pub actor: UserId,
    pub material_id: MaterialId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub source: InboundSource,
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl ReceiveStockCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.quantity <= 0 {
            return Err(AppError::validation(format!(
                "Inbound quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.unit_price.as_ref().is_some_and(Money::is_negative) {
            return Err(AppError::validation("Unit price must not be negative"));
        }
        Ok(())
    }
}

impl Command for ReceiveStockCommand {
    type Result = ReceiveStockResult;
}

/// 入库结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiveStockResult {
    pub lot: Lot,
    pub entry: LedgerEntry,
}
