//! 库存分配命令

use cuba_cqrs_core::Command;
use cuba_domain_core::{Money, UserId};
use cuba_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{DemandLine, LedgerEntry};
use crate::domain::enums::LedgerReason;
use crate::domain::value_objects::{DemandLineId, LocationScope, MaterialId};

/// 批次请求中的一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationLine {
    pub demand_line_id: DemandLineId,
    pub material_id: MaterialId,
    pub requested_qty: i64,
    #[serde(default)]
    pub locations: LocationScope,
    /// 记在台账分录上的单价
    #[serde(default)]
    pub unit_price: Option<Money>,
}

impl AllocationLine {
    pub fn new(
        demand_line_id: DemandLineId,
        material_id: MaterialId,
        requested_qty: i64,
        locations: LocationScope,
    ) -> Self {
        Self {
            demand_line_id,
            material_id,
            requested_qty,
            locations,
            unit_price: None,
        }
    }

    pub fn with_unit_price(mut self, unit_price: Money) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// 分配命令：同一外部请求中的全部需求行，整体提交或整体回滚
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateStockCommand {
    /// 操作人，仅用于台账归属
    pub actor: UserId,
    /// 台账业务说明
    pub reason: LedgerReason,
    pub lines: Vec<AllocationLine>,
}

impl AllocateStockCommand {
    pub fn new(actor: UserId, lines: Vec<AllocationLine>) -> Self {
        Self {
            actor,
            reason: LedgerReason::Order,
            lines,
        }
    }

    pub fn with_reason(mut self, reason: LedgerReason) -> Self {
        self.reason = reason;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.lines.is_empty() {
            return Err(AppError::validation("Allocation request has no lines"));
        }

        for line in &self.lines {
            if line.requested_qty < 0 {
                return Err(AppError::validation(format!(
                    "Requested quantity for demand line {} must not be negative",
                    line.demand_line_id
                )));
            }
            if line.unit_price.as_ref().is_some_and(Money::is_negative) {
                return Err(AppError::validation(format!(
                    "Unit price for demand line {} must not be negative",
                    line.demand_line_id
                )));
            }
        }
        Ok(())
    }
}

impl Command for AllocateStockCommand {
    type Result = AllocateStockResult;
}

/// 单行分配结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAllocation {
    /// 更新后的需求行
    pub demand_line: DemandLine,
    pub requested: i64,
    pub allocated: i64,
    /// 本次请求未满足的数量
    pub shortfall: i64,
    /// 本次写入的台账分录
    pub ledger_entries: Vec<LedgerEntry>,
}

/// 分配结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocateStockResult {
    pub lines: Vec<LineAllocation>,
    /// 包含冲突重试在内的执行次数
    pub attempts: u32,
}

impl AllocateStockResult {
    pub fn total_allocated(&self) -> i64 {
        self.lines.iter().map(|l| l.allocated).sum()
    }

    pub fn ledger_entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.lines.iter().flat_map(|l| l.ledger_entries.iter())
    }
}
