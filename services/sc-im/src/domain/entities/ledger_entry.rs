//! 台账分录

use chrono::{DateTime, Utc};
use cuba_domain_core::{Entity, Money, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Lot;
use crate::domain::enums::{BalanceComponent, LedgerAction, LedgerReason};
use crate::domain::value_objects::{LedgerEntryId, LedgerReference, LotBalance, LotId};

/// 一次变动的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerCause {
    pub action: LedgerAction,
    pub reason: LedgerReason,
    pub reference: Option<LedgerReference>,
}

impl LedgerCause {
    pub fn new(
        action: LedgerAction,
        reason: LedgerReason,
        reference: Option<LedgerReference>,
    ) -> Self {
        Self {
            action,
            reason,
            reference,
        }
    }
}

/// 台账分录：对单个批次的一次余额变动，写入后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub lot_id: LotId,
    /// 批次内序号，从 1 开始，等于变动后的批次版本
    pub sequence: i64,
    pub quantity_delta: i64,
    pub action: LedgerAction,
    pub reason: LedgerReason,
    pub existing: LotBalance,
    pub updated: LotBalance,
    pub reference: Option<LedgerReference>,
    pub unit_price: Option<Money>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// 为已变动的批次记一笔分录，`existing` 为变动前余额
    pub fn record(
        lot: &Lot,
        existing: LotBalance,
        quantity_delta: i64,
        cause: LedgerCause,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            lot_id: *lot.id(),
            sequence: lot.version(),
            quantity_delta,
            action: cause.action,
            reason: cause.reason,
            existing,
            updated: lot.balance(),
            reference: cause.reference,
            unit_price: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_unit_price(mut self, unit_price: Option<Money>) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn with_created_by(mut self, created_by: Option<UserId>) -> Self {
        self.created_by = created_by;
        self
    }

    /// 把本分录的增减量作用到给定余额上
    pub fn apply_to(&self, balance: LotBalance) -> LotBalance {
        match self.action.affects() {
            BalanceComponent::Quantity => {
                LotBalance::new(balance.quantity + self.quantity_delta, balance.reserve)
            }
            BalanceComponent::Reserve => {
                LotBalance::new(balance.quantity, balance.reserve + self.quantity_delta)
            }
        }
    }

    /// 变动后快照是否等于变动前快照加增减量
    pub fn is_self_consistent(&self) -> bool {
        self.apply_to(self.existing) == self.updated
    }
}

impl Entity for LedgerEntry {
    type Id = LedgerEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
