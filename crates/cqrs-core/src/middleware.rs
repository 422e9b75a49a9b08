//! Middleware 定义

use async_trait::async_trait;
use cuba_errors::AppResult;

use crate::{Command, CommandHandler, Query, QueryHandler};

/// 日志中间件
///
/// 包装任意 handler，在执行前后记录命令/查询名称与结果。
pub struct LoggingMiddleware<H> {
    inner: H,
}

impl<H> LoggingMiddleware<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

fn short_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[async_trait]
impl<C, H> CommandHandler<C> for LoggingMiddleware<H>
where
    C: Command + 'static,
    H: CommandHandler<C>,
{
    async fn handle(&self, command: C) -> AppResult<C::Result> {
        let name = short_name::<C>();
        tracing::debug!(command = name, "Executing command");

        let result = self.inner.handle(command).await;
        match &result {
            Ok(_) => tracing::debug!(command = name, "Command executed successfully"),
            Err(e) => tracing::error!(command = name, error = %e, "Command failed"),
        }
        result
    }
}

#[async_trait]
impl<Q, H> QueryHandler<Q> for LoggingMiddleware<H>
where
    Q: Query + 'static,
    H: QueryHandler<Q>,
{
    async fn handle(&self, query: Q) -> AppResult<Q::Result> {
        let name = short_name::<Q>();
        tracing::debug!(query = name, "Executing query");

        let result = self.inner.handle(query).await;
        if let Err(e) = &result {
            tracing::error!(query = name, error = %e, "Query failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuba_errors::AppError;

    struct Double(i64);

    impl Command for Double {
        type Result = i64;
    }

    struct Lookup(&'static str);

    impl Query for Lookup {
        type Result = String;
    }

    struct Handler;

    #[async_trait]
    impl CommandHandler<Double> for Handler {
        async fn handle(&self, command: Double) -> AppResult<i64> {
            if command.0 < 0 {
                return Err(AppError::validation("negative"));
            }
            Ok(command.0 * 2)
        }
    }

    #[async_trait]
    impl QueryHandler<Lookup> for Handler {
        async fn handle(&self, query: Lookup) -> AppResult<String> {
            Ok(query.0.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_middleware_passes_results_through() {
        let handler = LoggingMiddleware::new(Handler);

        assert_eq!(CommandHandler::handle(&handler, Double(21)).await.unwrap(), 42);
        assert!(matches!(
            CommandHandler::handle(&handler, Double(-1)).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(QueryHandler::handle(&handler, Lookup("lot")).await.unwrap(), "LOT");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name::<Double>(), "Double");
    }
}
