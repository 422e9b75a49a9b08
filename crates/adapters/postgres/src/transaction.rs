//! PostgreSQL 事务管理模块

use std::time::Duration;

use cuba_errors::AppResult;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::map_sqlx_error;

/// 事务隔离级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    /// 读已提交（PostgreSQL 默认）
    #[default]
    ReadCommitted,
    /// 可重复读
    RepeatableRead,
    /// 可串行化
    Serializable,
}

impl IsolationLevel {
    /// 转换为 SQL 字符串
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// 事务选项
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    /// 隔离级别
    pub isolation_level: IsolationLevel,
    /// 事务内等待行锁的上限，None 表示沿用会话设置
    pub lock_timeout: Option<Duration>,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// 生成事务开始后需要执行的语句
    pub fn to_statements(&self) -> Vec<String> {
        let mut statements = vec![format!(
            "SET TRANSACTION ISOLATION LEVEL {}",
            self.isolation_level.as_sql()
        )];

        if let Some(timeout) = self.lock_timeout {
            // SET LOCAL 只在当前事务内生效
            statements.push(format!(
                "SET LOCAL lock_timeout = '{}ms'",
                timeout.as_millis().max(1)
            ));
        }

        statements
    }
}

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 开始带选项的事务
    pub async fn begin_with_options(
        &self,
        options: &TransactionOptions,
    ) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for statement in options.to_statements() {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        debug!(
            isolation_level = options.isolation_level.as_sql(),
            lock_timeout_ms = options.lock_timeout.map(|t| t.as_millis() as u64),
            "Transaction started"
        );

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level() {
        assert_eq!(IsolationLevel::ReadCommitted.as_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.as_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_default_statements() {
        let statements = TransactionOptions::new().to_statements();
        assert_eq!(
            statements,
            vec!["SET TRANSACTION ISOLATION LEVEL READ COMMITTED".to_string()]
        );
    }

    #[test]
    fn test_lock_timeout_statement() {
        let statements = TransactionOptions::new()
            .with_isolation_level(IsolationLevel::RepeatableRead)
            .with_lock_timeout(Duration::from_millis(2500))
            .to_statements();

        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("REPEATABLE READ"));
        assert_eq!(statements[1], "SET LOCAL lock_timeout = '2500ms'");
    }
}
