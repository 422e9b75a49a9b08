//! PostgreSQL Unit of Work 实现

use std::sync::Arc;

use async_trait::async_trait;
use cuba_adapter_postgres::{
    IsolationLevel, TransactionManager, TransactionOptions, map_sqlx_error,
};
use cuba_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use super::tx_repositories::{
    SharedTx, TxDemandLineRepository, TxLedgerRepository, TxLotRepository, TxMaterialRepository,
};
use crate::domain::repositories::{
    DemandLineRepository, LedgerRepository, LotRepository, MaterialRepository,
};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// Postgres Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    tx_manager: TransactionManager,
    options: TransactionOptions,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool),
            options: TransactionOptions::default(),
        }
    }

    /// 事务选项（隔离级别、锁等待上限）
    pub fn with_options(mut self, options: TransactionOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.tx_manager.begin_with_options(&self.options).await?;
        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }

    /// 可重复读：整个事务共用首条语句的快照
    async fn begin_snapshot(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let options = self
            .options
            .clone()
            .with_isolation_level(IsolationLevel::RepeatableRead);
        let tx = self.tx_manager.begin_with_options(&options).await?;
        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// Postgres Unit of Work 实现
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    lot_repo: TxLotRepository,
    ledger_repo: TxLedgerRepository,
    demand_line_repo: TxDemandLineRepository,
    material_repo: TxMaterialRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx = Arc::new(Mutex::new(Some(tx)));

        Self {
            tx: tx.clone(),
            lot_repo: TxLotRepository::new(tx.clone()),
            ledger_repo: TxLedgerRepository::new(tx.clone()),
            demand_line_repo: TxDemandLineRepository::new(tx.clone()),
            material_repo: TxMaterialRepository::new(tx),
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn lots(&self) -> &dyn LotRepository {
        &self.lot_repo
    }

    fn ledger(&self) -> &dyn LedgerRepository {
        &self.ledger_repo
    }

    fn demand_lines(&self) -> &dyn DemandLineRepository {
        &self.demand_line_repo
    }

    fn materials(&self) -> &dyn MaterialRepository {
        &self.material_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        // 提交时的串行化失败同样按并发冲突处理
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}
