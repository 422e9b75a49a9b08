//! 命令/查询处理器

mod allocation_orchestrator;
mod inventory_query_handler;
mod place_demand_handler;
mod receive_stock_handler;

pub use allocation_orchestrator::*;
pub use inventory_query_handler::*;
pub use place_demand_handler::*;
pub use receive_stock_handler::*;

use cuba_errors::AppResult;
use tracing::warn;

use crate::domain::unit_of_work::UnitOfWork;

/// 成功则提交，失败则回滚并返回原始错误
pub(crate) async fn finish<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

/// 只读工作单元：无论结果如何都回滚
pub(crate) async fn discard<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    if let Err(rollback_err) = uow.rollback().await {
        warn!(error = %rollback_err, "Rollback failed");
    }
    result
}
