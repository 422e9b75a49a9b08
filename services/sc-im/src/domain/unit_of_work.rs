//! Unit of Work 模式
//!
//! 一次分配请求内的所有批次变动、台账分录和需求行更新在同一个工作单元中提交或回滚。

use async_trait::async_trait;
use cuba_errors::AppResult;

use crate::domain::repositories::{
    DemandLineRepository, LedgerRepository, LotRepository, MaterialRepository,
};

/// Unit of Work trait
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
///
/// uow.lots().update(&lot).await?;
/// uow.ledger().append(&entry).await?;
///
/// uow.commit().await?;
/// ```
///
/// 未提交即丢弃的工作单元等同于回滚。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn lots(&self) -> &dyn LotRepository;

    fn ledger(&self) -> &dyn LedgerRepository;

    fn demand_lines(&self) -> &dyn DemandLineRepository;

    fn materials(&self) -> &dyn MaterialRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;

    /// 只读查询用：所有读取看到同一个一致快照，不受并发提交影响
    async fn begin_snapshot(&self) -> AppResult<Box<dyn UnitOfWork>> {
        self.begin().await
    }
}
