//! 数据库错误映射工具
//!
//! 提供统一的 SQLx 错误到 AppError 的转换

use cuba_errors::AppError;

/// 串行化失败
pub const SERIALIZATION_FAILURE: &str = "40001";
/// 检测到死锁
pub const DEADLOCK_DETECTED: &str = "40P01";
/// 获取锁失败（lock_timeout 到期或 NOWAIT）
pub const LOCK_NOT_AVAILABLE: &str = "55P03";

/// 根据 SQLSTATE 将数据库错误归类
fn map_sqlstate(code: &str, message: String) -> AppError {
    match code {
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE => {
            AppError::concurrency_conflict(format!("({}) {}", code, message))
        }
        // PostgreSQL 约束违规代码
        "23505" => AppError::conflict("Duplicate entry violates unique constraint"),
        "23503" => AppError::validation("Foreign key constraint violation"),
        "23514" => AppError::validation("Check constraint violation"),
        "23502" => AppError::validation("Not null constraint violation"),
        "22P02" => AppError::validation("Invalid input syntax"),
        _ => AppError::database(format!("Database error ({}): {}", code, message)),
    }
}

/// 将 SQLx 错误转换为 AppError，区分不同错误类型
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => map_sqlstate(code.as_ref(), db_err.message().to_string()),
            None => AppError::database(db_err.to_string()),
        },
        sqlx::Error::PoolTimedOut => AppError::internal("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::internal("Database connection pool is closed"),
        sqlx::Error::Protocol(msg) => {
            AppError::internal(format!("Database protocol error: {}", msg))
        }
        _ => AppError::database(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_lock_errors_are_concurrency_conflicts() {
        for code in [SERIALIZATION_FAILURE, DEADLOCK_DETECTED, LOCK_NOT_AVAILABLE] {
            let err = map_sqlstate(code, "canceling statement".to_string());
            assert!(err.is_retryable(), "{} should be retryable", code);
        }
    }

    #[test]
    fn test_constraint_errors() {
        assert!(matches!(
            map_sqlstate("23514", String::new()),
            AppError::Validation(_)
        ));
        assert!(matches!(
            map_sqlstate("23505", String::new()),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            map_sqlstate("XX000", "internal".to_string()),
            AppError::Database(_)
        ));
    }
}
