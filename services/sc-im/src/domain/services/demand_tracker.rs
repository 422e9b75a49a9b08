//! 需求行跟踪：把分配结果计入需求行

use cuba_domain_core::{Entity, UserId};
use cuba_errors::{AppError, AppResult};

use crate::domain::entities::DemandLine;
use crate::domain::services::AllocationOutcome;

#[derive(Debug, Default, Clone, Copy)]
pub struct DemandTracker;

impl DemandTracker {
    /// 计入分配数量；返回需求行是否发生变化（未分配到任何数量时不变）
    pub fn track(
        &self,
        line: &mut DemandLine,
        outcome: &AllocationOutcome,
        actor: Option<UserId>,
    ) -> AppResult<bool> {
        if outcome.demand_line_id != *line.id() {
            return Err(AppError::internal(format!(
                "Allocation for demand line {} applied to {}",
                outcome.demand_line_id,
                line.id()
            )));
        }
        if outcome.allocated == 0 {
            return Ok(false);
        }

        line.record_reservation(outcome.allocated, actor)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enums::{DemandSource, ReservationState};
    use crate::domain::value_objects::{DemandLineId, MaterialId, OrderId};

    fn outcome(line_id: DemandLineId, allocated: i64) -> AllocationOutcome {
        AllocationOutcome {
            demand_line_id: line_id,
            requested: allocated,
            allocated,
            reservations: Vec::new(),
        }
    }

    fn line() -> DemandLine {
        DemandLine::new(
            DemandSource::Order(OrderId::new()),
            MaterialId::new(),
            120,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_track_accumulates() {
        let mut line = line();
        let id = *line.id();
        let changed = DemandTracker
            .track(&mut line, &outcome(id, 120), None)
            .unwrap();

        assert!(changed);
        assert_eq!(line.reserved_qty(), 120);
        assert_eq!(line.reservation_state(), ReservationState::FullyReserved);
    }

    #[test]
    fn test_zero_allocation_leaves_line() {
        let mut line = line();
        let before = line.clone();
        let id = *line.id();
        let changed = DemandTracker
            .track(&mut line, &outcome(id, 0), None)
            .unwrap();

        assert!(!changed);
        assert_eq!(line, before);
    }

    #[test]
    fn test_mismatched_line_rejected() {
        let mut line = line();
        let result = DemandTracker.track(&mut line, &outcome(DemandLineId::new(), 1), None);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
