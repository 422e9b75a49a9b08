//! 进程内调用入口
//!
//! 订单、计划等上层请求处理器通过这里调用库存核心；每个处理器都包一层日志中间件。

use std::sync::Arc;

use cuba_config::AllocationConfig;
use cuba_cqrs_core::{CommandHandler, LoggingMiddleware, QueryHandler};
use cuba_errors::AppResult;

use crate::application::commands::{
    AllocateStockCommand, AllocateStockResult, PlaceDemandCommand, ReceiveStockCommand,
    ReceiveStockResult,
};
use crate::application::handlers::{
    AllocationOrchestrator, InventoryQueryHandler, PlaceDemandHandler, ReceiveStockHandler,
};
use crate::application::queries::{
    DemandLineView, GetDemandLineQuery, GetLotLedgerQuery, VerifyLotQuery,
};
use crate::domain::entities::{DemandLine, LedgerEntry};
use crate::domain::services::ChainReport;
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::domain::value_objects::{DemandLineId, LotId};

pub struct InventoryService {
    allocation: LoggingMiddleware<AllocationOrchestrator>,
    receive_stock: LoggingMiddleware<ReceiveStockHandler>,
    place_demand: LoggingMiddleware<PlaceDemandHandler>,
    queries: LoggingMiddleware<InventoryQueryHandler>,
}

impl InventoryService {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, config: &AllocationConfig) -> Self {
        Self {
            allocation: LoggingMiddleware::new(AllocationOrchestrator::new(
                uow_factory.clone(),
                config.retry_config(),
            )),
            receive_stock: LoggingMiddleware::new(ReceiveStockHandler::new(uow_factory.clone())),
            place_demand: LoggingMiddleware::new(PlaceDemandHandler::new(uow_factory.clone())),
            queries: LoggingMiddleware::new(InventoryQueryHandler::new(uow_factory)),
        }
    }

    pub async fn allocate(&self, command: AllocateStockCommand) -> AppResult<AllocateStockResult> {
        CommandHandler::handle(&self.allocation, command).await
    }

    pub async fn receive_stock(
        &self,
        command: ReceiveStockCommand,
    ) -> AppResult<ReceiveStockResult> {
        CommandHandler::handle(&self.receive_stock, command).await
    }

    pub async fn place_demand(&self, command: PlaceDemandCommand) -> AppResult<DemandLine> {
        CommandHandler::handle(&self.place_demand, command).await
    }

    pub async fn lot_ledger(&self, lot_id: LotId) -> AppResult<Vec<LedgerEntry>> {
        QueryHandler::handle(&self.queries, GetLotLedgerQuery { lot_id }).await
    }

    pub async fn verify_lot(&self, lot_id: LotId) -> AppResult<ChainReport> {
        QueryHandler::handle(&self.queries, VerifyLotQuery { lot_id }).await
    }

    pub async fn demand_line(&self, demand_line_id: DemandLineId) -> AppResult<DemandLineView> {
        QueryHandler::handle(&self.queries, GetDemandLineQuery { demand_line_id }).await
    }
}
