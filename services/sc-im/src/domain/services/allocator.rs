//! 分配算法
//!
//! 按序列顺序逐批次预留，直到需求满足或批次耗尽。数量不足不是错误，
//! 返回部分分配结果。

use cuba_domain_core::{Money, UserId};
use cuba_errors::{AppError, AppResult};
use serde::Serialize;

use crate::domain::entities::{LedgerCause, LedgerEntry, Lot};
use crate::domain::enums::{LedgerAction, LedgerReason};
use crate::domain::value_objects::{DemandLineId, LedgerReference};

/// 分配上下文：写在台账分录上的归属信息
#[derive(Debug, Clone)]
pub struct AllocationContext {
    pub demand_line_id: DemandLineId,
    pub reason: LedgerReason,
    pub unit_price: Option<Money>,
    pub actor: Option<UserId>,
}

impl AllocationContext {
    pub fn for_demand(demand_line_id: DemandLineId, actor: Option<UserId>) -> Self {
        Self {
            demand_line_id,
            reason: LedgerReason::Order,
            unit_price: None,
            actor,
        }
    }

    pub fn with_reason(mut self, reason: LedgerReason) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_unit_price(mut self, unit_price: Option<Money>) -> Self {
        self.unit_price = unit_price;
        self
    }

    fn cause(&self) -> LedgerCause {
        LedgerCause::new(
            LedgerAction::Reserve,
            self.reason,
            Some(LedgerReference::DemandLine(self.demand_line_id)),
        )
    }
}

/// 单个批次上的预留：变动后的批次与对应分录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotReservation {
    pub lot: Lot,
    pub entry: LedgerEntry,
}

/// 一次分配的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationOutcome {
    pub demand_line_id: DemandLineId,
    pub requested: i64,
    pub allocated: i64,
    pub reservations: Vec<LotReservation>,
}

impl AllocationOutcome {
    pub fn is_fully_satisfied(&self) -> bool {
        self.allocated == self.requested
    }

    pub fn shortfall(&self) -> i64 {
        self.requested - self.allocated
    }

    pub fn ledger_entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.reservations.iter().map(|r| &r.entry)
    }
}

/// 分配器，不做任何 IO
#[derive(Debug, Default, Clone, Copy)]
pub struct Allocator;

impl Allocator {
    pub fn allocate<I>(
        &self,
        requested: i64,
        lots: I,
        context: &AllocationContext,
    ) -> AppResult<AllocationOutcome>
    where
        I: IntoIterator<Item = Lot>,
    {
        if requested < 0 {
            return Err(AppError::validation(format!(
                "Requested quantity must not be negative, got {}",
                requested
            )));
        }

        let mut remaining = requested;
        let mut reservations = Vec::new();
        let mut lots = lots.into_iter();

        while remaining > 0 {
            let Some(mut lot) = lots.next() else {
                break;
            };

            let take = lot.available_qty().min(remaining);
            if take <= 0 {
                continue;
            }

            let existing = lot.reserve_units(take)?;
            let entry = LedgerEntry::record(&lot, existing, take, context.cause())
                .with_unit_price(context.unit_price.clone())
                .with_created_by(context.actor.clone());

            remaining -= take;
            reservations.push(LotReservation { lot, entry });
        }

        Ok(AllocationOutcome {
            demand_line_id: context.demand_line_id,
            requested,
            allocated: requested - remaining,
            reservations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{LocationId, LotBalance, MaterialId};
    use chrono::{Duration, Utc};
    use cuba_domain_core::Entity;

    fn lots(quantities: &[i64]) -> Vec<Lot> {
        let material = MaterialId::new();
        let location = LocationId::new();
        let base = Utc::now();
        quantities
            .iter()
            .enumerate()
            .map(|(i, qty)| {
                Lot::receive(material, location, *qty, None)
                    .unwrap()
                    .with_created_at(base + Duration::seconds(i as i64))
            })
            .collect()
    }

    fn context() -> AllocationContext {
        AllocationContext::for_demand(DemandLineId::new(), Some(UserId::new()))
    }

    #[test]
    fn test_spans_lots_in_order() {
        let lots = lots(&[100, 50]);
        let (a, b) = (*lots[0].id(), *lots[1].id());

        let outcome = Allocator.allocate(120, lots, &context()).unwrap();

        assert_eq!(outcome.allocated, 120);
        assert!(outcome.is_fully_satisfied());
        assert_eq!(outcome.reservations.len(), 2);

        let first = &outcome.reservations[0];
        assert_eq!(*first.lot.id(), a);
        assert_eq!(first.lot.available_qty(), 0);
        assert!(first.lot.is_out_of_stock());
        assert_eq!(first.entry.existing, LotBalance::new(100, 0));
        assert_eq!(first.entry.updated, LotBalance::new(100, 100));

        let second = &outcome.reservations[1];
        assert_eq!(*second.lot.id(), b);
        assert_eq!(second.lot.available_qty(), 30);
        assert_eq!(second.lot.reserve(), 20);
        assert_eq!(second.entry.quantity_delta, 20);
    }

    #[test]
    fn test_partial_when_stock_runs_out() {
        let outcome = Allocator.allocate(200, lots(&[100, 50]), &context()).unwrap();

        assert_eq!(outcome.allocated, 150);
        assert_eq!(outcome.shortfall(), 50);
        assert!(!outcome.is_fully_satisfied());
        assert!(outcome.reservations.iter().all(|r| r.lot.is_out_of_stock()));
    }

    #[test]
    fn test_no_lots_allocates_nothing() {
        let outcome = Allocator.allocate(10, Vec::new(), &context()).unwrap();
        assert_eq!(outcome.allocated, 0);
        assert!(outcome.reservations.is_empty());
    }

    #[test]
    fn test_zero_request_touches_nothing() {
        let outcome = Allocator.allocate(0, lots(&[10]), &context()).unwrap();
        assert_eq!(outcome.allocated, 0);
        assert!(outcome.reservations.is_empty());
        assert!(outcome.is_fully_satisfied());
    }

    #[test]
    fn test_stops_consuming_once_satisfied() {
        let mut sequence = lots(&[10, 10, 10]).into_iter();
        let outcome = Allocator.allocate(10, sequence.by_ref(), &context()).unwrap();

        assert_eq!(outcome.reservations.len(), 1);
        assert_eq!(sequence.count(), 2);
    }

    #[test]
    fn test_negative_request_rejected() {
        let result = Allocator.allocate(-1, lots(&[10]), &context());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_entries_carry_context() {
        let ctx = context().with_unit_price(Some(Money::cny(350)));
        let outcome = Allocator.allocate(5, lots(&[10]), &ctx).unwrap();
        let entry = &outcome.reservations[0].entry;

        assert_eq!(entry.action, LedgerAction::Reserve);
        assert_eq!(entry.reason, LedgerReason::Order);
        assert_eq!(entry.reference, Some(LedgerReference::DemandLine(ctx.demand_line_id)));
        assert_eq!(entry.unit_price, Some(Money::cny(350)));
        assert_eq!(entry.created_by, ctx.actor);
    }
}
