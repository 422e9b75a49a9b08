//! 需求行查询

use cuba_cqrs_core::Query;
use cuba_domain_core::Entity;
use serde::{Deserialize, Serialize};

use crate::domain::entities::DemandLine;
use crate::domain::enums::{ReservationState, WithdrawalState};
use crate::domain::value_objects::DemandLineId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDemandLineQuery {
    pub demand_line_id: DemandLineId,
}

impl Query for GetDemandLineQuery {
    type Result = DemandLineView;
}

/// 需求行及其满足情况
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandLineView {
    pub demand_line_id: DemandLineId,
    pub target_qty: i64,
    pub reserved_qty: i64,
    pub withdrawn_qty: i64,
    pub outstanding_qty: i64,
    pub reservation_state: ReservationState,
    pub withdrawal_state: WithdrawalState,
}

impl From<&DemandLine> for DemandLineView {
    fn from(line: &DemandLine) -> Self {
        Self {
            demand_line_id: *line.id(),
            target_qty: line.target_qty(),
            reserved_qty: line.reserved_qty(),
            withdrawn_qty: line.withdrawn_qty(),
            outstanding_qty: line.outstanding_qty(),
            reservation_state: line.reservation_state(),
            withdrawal_state: line.withdrawal_state(),
        }
    }
}
