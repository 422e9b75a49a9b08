//! Command / Query 与对应的 Handler
//!
//! 命令在一个工作单元内修改状态，查询只读；两者都以 `AppResult` 返回。

use async_trait::async_trait;
use cuba_errors::AppResult;

/// 修改状态的请求
pub trait Command: Send + Sync {
    type Result: Send;
}

/// 只读请求
pub trait Query: Send + Sync {
    type Result: Send;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C) -> AppResult<C::Result>;
}

#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn handle(&self, query: Q) -> AppResult<Q::Result>;
}
