//! 需求行状态

use serde::{Deserialize, Serialize};

/// 预留进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationState {
    /// 未分配
    Unallocated,
    /// 部分预留
    PartiallyReserved,
    /// 已满足
    FullyReserved,
}

/// 领用进度，与预留进度相互独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawalState {
    NotWithdrawn,
    PartiallyWithdrawn,
    FullyWithdrawn,
}
