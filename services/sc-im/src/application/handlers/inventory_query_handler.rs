//! 库存查询处理器

use std::sync::Arc;

use async_trait::async_trait;
use cuba_cqrs_core::QueryHandler;
use cuba_errors::{AppError, AppResult};
use tracing::{info, warn};

use super::discard;
use crate::application::queries::{
    DemandLineView, GetDemandLineQuery, GetLotLedgerQuery, VerifyLotQuery,
};
use crate::domain::entities::{LedgerEntry, Lot};
use crate::domain::services::{ChainReport, LedgerChain};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::LotId;

pub struct InventoryQueryHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl InventoryQueryHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 批次与台账在同一快照内读取
    async fn load_lot(
        &self,
        uow: &dyn UnitOfWork,
        lot_id: &LotId,
    ) -> AppResult<(Lot, Vec<LedgerEntry>)> {
        let lot = uow
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lot {} not found", lot_id)))?;
        let entries = uow.ledger().list_by_lot(lot_id).await?;
        Ok((lot, entries))
    }
}

#[async_trait]
impl QueryHandler<GetLotLedgerQuery> for InventoryQueryHandler {
    async fn handle(&self, query: GetLotLedgerQuery) -> AppResult<Vec<LedgerEntry>> {
        let uow = self.uow_factory.begin_snapshot().await?;
        let result = self.load_lot(uow.as_ref(), &query.lot_id).await;
        let (_, entries) = discard(uow, result).await?;
        Ok(entries)
    }
}

#[async_trait]
impl QueryHandler<VerifyLotQuery> for InventoryQueryHandler {
    async fn handle(&self, query: VerifyLotQuery) -> AppResult<ChainReport> {
        let uow = self.uow_factory.begin_snapshot().await?;
        let result = self.load_lot(uow.as_ref(), &query.lot_id).await;
        let (lot, entries) = discard(uow, result).await?;

        let report = LedgerChain::verify(&lot, &entries);
        if report.is_consistent() {
            info!(lot_id = %query.lot_id, entries = report.entry_count, "Lot ledger verified");
        } else {
            warn!(
                lot_id = %query.lot_id,
                breaks = report.breaks.len(),
                replayed = %report.replayed,
                current = %report.current,
                "Lot ledger inconsistent"
            );
        }
        Ok(report)
    }
}

#[async_trait]
impl QueryHandler<GetDemandLineQuery> for InventoryQueryHandler {
    async fn handle(&self, query: GetDemandLineQuery) -> AppResult<DemandLineView> {
        let uow = self.uow_factory.begin_snapshot().await?;
        let result = uow.demand_lines().find_by_id(&query.demand_line_id).await;
        let line = discard(uow, result).await?.ok_or_else(|| {
            AppError::not_found(format!("Demand line {} not found", query.demand_line_id))
        })?;
        Ok(DemandLineView::from(&line))
    }
}
