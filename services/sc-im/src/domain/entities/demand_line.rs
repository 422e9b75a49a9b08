//! 需求行实体

use cuba_domain_core::{AggregateRoot, AuditInfo, Entity, UserId, Versioned};
use cuba_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::{DemandSource, ReservationState, WithdrawalState};
use crate::domain::value_objects::{DemandLineId, MaterialId};

/// 需求行（如订单 BOM 行）
///
/// 约束：`reserved_qty + withdrawn_qty <= target_qty`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandLine {
    id: DemandLineId,
    source: DemandSource,
    material_id: MaterialId,
    target_qty: i64,
    reserved_qty: i64,
    withdrawn_qty: i64,
    is_full_filled: bool,
    is_completely_withdraw: bool,
    version: i64,
    audit_info: AuditInfo,
}

impl DemandLine {
    pub fn new(
        source: DemandSource,
        material_id: MaterialId,
        target_qty: i64,
        created_by: Option<UserId>,
    ) -> AppResult<Self> {
        if target_qty <= 0 {
            return Err(AppError::validation(format!(
                "Target quantity must be positive, got {}",
                target_qty
            )));
        }

        Ok(Self {
            id: DemandLineId::new(),
            source,
            material_id,
            target_qty,
            reserved_qty: 0,
            withdrawn_qty: 0,
            is_full_filled: false,
            is_completely_withdraw: false,
            version: 1,
            audit_info: AuditInfo::new(created_by),
        })
    }

    /// 从持久化状态重建；完成标记按计数器重新推导
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: DemandLineId,
        source: DemandSource,
        material_id: MaterialId,
        target_qty: i64,
        reserved_qty: i64,
        withdrawn_qty: i64,
        version: i64,
        audit_info: AuditInfo,
    ) -> Self {
        let mut line = Self {
            id,
            source,
            material_id,
            target_qty,
            reserved_qty,
            withdrawn_qty,
            is_full_filled: false,
            is_completely_withdraw: false,
            version,
            audit_info,
        };
        line.recompute_flags();
        line
    }

    pub fn source(&self) -> &DemandSource {
        &self.source
    }

    pub fn material_id(&self) -> &MaterialId {
        &self.material_id
    }

    pub fn target_qty(&self) -> i64 {
        self.target_qty
    }

    pub fn reserved_qty(&self) -> i64 {
        self.reserved_qty
    }

    pub fn withdrawn_qty(&self) -> i64 {
        self.withdrawn_qty
    }

    pub fn is_full_filled(&self) -> bool {
        self.is_full_filled
    }

    pub fn is_completely_withdraw(&self) -> bool {
        self.is_completely_withdraw
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// 尚未预留也未领用的数量
    pub fn outstanding_qty(&self) -> i64 {
        self.target_qty - self.reserved_qty - self.withdrawn_qty
    }

    pub fn reservation_state(&self) -> ReservationState {
        if self.is_full_filled {
            ReservationState::FullyReserved
        } else if self.reserved_qty == 0 && self.withdrawn_qty == 0 {
            ReservationState::Unallocated
        } else {
            ReservationState::PartiallyReserved
        }
    }

    pub fn withdrawal_state(&self) -> WithdrawalState {
        if self.is_completely_withdraw {
            WithdrawalState::FullyWithdrawn
        } else if self.withdrawn_qty == 0 {
            WithdrawalState::NotWithdrawn
        } else {
            WithdrawalState::PartiallyWithdrawn
        }
    }

    /// 已满足或已领完的需求行不能再分配
    pub fn ensure_allocatable(&self) -> AppResult<()> {
        if self.is_completely_withdraw {
            return Err(AppError::invalid_state(format!(
                "Demand line {} is already completely withdrawn",
                self.id
            )));
        }
        if self.is_full_filled {
            return Err(AppError::invalid_state(format!(
                "Demand line {} is already fully reserved",
                self.id
            )));
        }
        Ok(())
    }

    /// 记录一次分配结果
    pub fn record_reservation(&mut self, allocated: i64, actor: Option<UserId>) -> AppResult<()> {
        if allocated < 0 {
            return Err(AppError::validation(format!(
                "Allocated quantity must not be negative, got {}",
                allocated
            )));
        }
        if allocated == 0 {
            return Ok(());
        }
        if allocated > self.outstanding_qty() {
            return Err(AppError::invalid_state(format!(
                "Demand line {} would be over-allocated: target {}, reserved {}, withdrawn {}, allocating {}",
                self.id, self.target_qty, self.reserved_qty, self.withdrawn_qty, allocated
            )));
        }

        self.reserved_qty += allocated;
        self.recompute_flags();
        self.version += 1;
        self.audit_info.touch(actor);
        Ok(())
    }

    fn recompute_flags(&mut self) {
        self.is_full_filled = self.reserved_qty + self.withdrawn_qty == self.target_qty;
        self.is_completely_withdraw = self.withdrawn_qty == self.target_qty;
    }
}

impl Entity for DemandLine {
    type Id = DemandLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for DemandLine {
    fn version(&self) -> i64 {
        self.version
    }
}

impl AggregateRoot for DemandLine {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
