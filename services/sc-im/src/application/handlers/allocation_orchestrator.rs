//! 分配编排
//!
//! 先按 ID 升序锁定请求涉及的全部需求行，再对每一行依次执行：
//! 选批 → 分配 → 写台账 → 更新需求行。需求行锁总在批次锁之前、且顺序全局一致。
//! 整个请求在一个工作单元中完成，任何一行失败都会回滚全部变动；
//! 并发冲突时在新的工作单元中整体重试。

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use cuba_common::{RetryConfig, with_conditional_retry};
use cuba_cqrs_core::CommandHandler;
use cuba_errors::{AppError, AppResult};
use tracing::{info, instrument};

use super::finish;
use crate::application::commands::{
    AllocateStockCommand, AllocateStockResult, AllocationLine, LineAllocation,
};
use crate::application::ledger_writer::LedgerWriter;
use crate::application::metrics;
use crate::domain::services::{AllocationContext, Allocator, DemandTracker, LotSelector};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::DemandLineId;

pub struct AllocationOrchestrator {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    retry: RetryConfig,
    selector: LotSelector,
    allocator: Allocator,
    writer: LedgerWriter,
    tracker: DemandTracker,
}

impl AllocationOrchestrator {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, retry: RetryConfig) -> Self {
        Self {
            uow_factory,
            retry,
            selector: LotSelector,
            allocator: Allocator,
            writer: LedgerWriter,
            tracker: DemandTracker,
        }
    }

    /// 一次完整的尝试
    async fn run_batch(&self, command: &AllocateStockCommand) -> AppResult<Vec<LineAllocation>> {
        let uow = self.uow_factory.begin().await?;
        let result = self.allocate_lines(uow.as_ref(), command).await;
        finish(uow, result).await
    }

    async fn allocate_lines(
        &self,
        uow: &dyn UnitOfWork,
        command: &AllocateStockCommand,
    ) -> AppResult<Vec<LineAllocation>> {
        self.lock_demand_lines(uow, command).await?;

        let mut results = Vec::with_capacity(command.lines.len());
        for line in &command.lines {
            results.push(self.allocate_line(uow, command, line).await?);
        }
        Ok(results)
    }

    /// 去重后按 ID 升序加锁
    async fn lock_demand_lines(
        &self,
        uow: &dyn UnitOfWork,
        command: &AllocateStockCommand,
    ) -> AppResult<()> {
        let ids: BTreeSet<DemandLineId> =
            command.lines.iter().map(|l| l.demand_line_id).collect();
        for id in &ids {
            if uow.demand_lines().find_for_update(id).await?.is_none() {
                return Err(AppError::not_found(format!("Demand line {} not found", id)));
            }
        }
        Ok(())
    }

    async fn allocate_line(
        &self,
        uow: &dyn UnitOfWork,
        command: &AllocateStockCommand,
        request: &AllocationLine,
    ) -> AppResult<LineAllocation> {
        // 1. 需求行（本事务已持有行锁）
        let mut demand = uow
            .demand_lines()
            .find_for_update(&request.demand_line_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Demand line {} not found", request.demand_line_id))
            })?;

        // 2. 校验物料
        if !uow.materials().exists(&request.material_id).await? {
            return Err(AppError::not_found(format!(
                "Material {} not found",
                request.material_id
            )));
        }
        if demand.material_id() != &request.material_id {
            return Err(AppError::validation(format!(
                "Demand line {} is for material {}, not {}",
                request.demand_line_id,
                demand.material_id(),
                request.material_id
            )));
        }

        // 3. 需求行状态
        demand.ensure_allocatable()?;
        if request.requested_qty > demand.outstanding_qty() {
            return Err(AppError::validation(format!(
                "Requested {} exceeds outstanding {} on demand line {}",
                request.requested_qty,
                demand.outstanding_qty(),
                request.demand_line_id
            )));
        }

        // 4. 先进先出选批
        let lots = self
            .selector
            .select(uow.lots(), &request.material_id, &request.locations)
            .await?;

        // 5. 分配
        let context =
            AllocationContext::for_demand(request.demand_line_id, Some(command.actor.clone()))
                .with_reason(command.reason)
                .with_unit_price(request.unit_price.clone());
        let outcome = self
            .allocator
            .allocate(request.requested_qty, lots, &context)?;

        // 6. 批次变动与台账一起写入
        for reservation in &outcome.reservations {
            self.writer
                .write_mutation(uow, &reservation.lot, &reservation.entry)
                .await?;
        }

        // 7. 计入需求行
        if self
            .tracker
            .track(&mut demand, &outcome, Some(command.actor.clone()))?
        {
            uow.demand_lines().update(&demand).await?;
        }

        info!(
            demand_line_id = %request.demand_line_id,
            material_id = %request.material_id,
            requested = outcome.requested,
            allocated = outcome.allocated,
            lots = outcome.reservations.len(),
            "Demand line allocated"
        );

        Ok(LineAllocation {
            requested: outcome.requested,
            allocated: outcome.allocated,
            shortfall: outcome.shortfall(),
            ledger_entries: outcome.ledger_entries().cloned().collect(),
            demand_line: demand,
        })
    }
}

#[async_trait]
impl CommandHandler<AllocateStockCommand> for AllocationOrchestrator {
    #[instrument(skip_all, fields(actor = %command.actor, lines = command.lines.len()))]
    async fn handle(&self, command: AllocateStockCommand) -> AppResult<AllocateStockResult> {
        if let Err(e) = command.validate() {
            metrics::record_batch("rejected");
            return Err(e);
        }

        let attempts = AtomicU32::new(0);
        let result = with_conditional_retry(
            &self.retry,
            "allocate_stock",
            || {
                attempts.fetch_add(1, Ordering::Relaxed);
                self.run_batch(&command)
            },
            |e: &AppError| {
                let retryable = e.is_retryable();
                if retryable {
                    metrics::record_conflict();
                }
                retryable
            },
        )
        .await;
        let attempts = attempts.into_inner();

        match result {
            Ok(lines) => {
                metrics::record_batch("committed");
                for line in &lines {
                    metrics::record_allocation(line.allocated, line.shortfall);
                }

                let result = AllocateStockResult { lines, attempts };
                info!(
                    attempts,
                    allocated = result.total_allocated(),
                    "Allocation batch committed"
                );
                Ok(result)
            }
            Err(e) => {
                let outcome = if e.is_retryable() {
                    "conflict"
                } else if e.is_client_error() {
                    "rejected"
                } else {
                    "failed"
                };
                metrics::record_batch(outcome);
                Err(e)
            }
        }
    }
}
