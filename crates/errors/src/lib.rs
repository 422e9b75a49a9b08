//! cuba-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 并发写冲突（版本不匹配、锁等待超时、串行化失败），可重试
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn concurrency_conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 是否为可重试的瞬时错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InvalidState(_) => 409,
            Self::Conflict(_) => 409,
            Self::ConcurrencyConflict(_) => 503,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// 是否为客户端错误（4xx）
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: format!("https://api.cuba-erp.com/problems/{}", self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::InvalidState(_) => "invalid-state",
            Self::Conflict(_) => "conflict",
            Self::ConcurrencyConflict(_) => "concurrency-conflict",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::InvalidState(_) => "Invalid State",
            Self::Conflict(_) => "Conflict",
            Self::ConcurrencyConflict(_) => "Concurrency Conflict",
            Self::Database(_) => "Database Error",
            Self::Internal(_) => "Internal Server Error",
        }
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_concurrency_conflict_is_retryable() {
        assert!(AppError::concurrency_conflict("lot version changed").is_retryable());
        assert!(!AppError::database("disk full").is_retryable());
        assert!(!AppError::invalid_state("fully reserved").is_retryable());
        assert!(!AppError::not_found("lot").is_retryable());
    }

    #[test]
    fn test_client_server_classification() {
        assert!(AppError::not_found("demand line").is_client_error());
        assert!(AppError::validation("negative quantity").is_client_error());
        assert!(AppError::invalid_state("fully withdrawn").is_client_error());
        assert!(!AppError::concurrency_conflict("retry exhausted").is_client_error());
        assert!(!AppError::database("write failed").is_client_error());
    }

    #[test]
    fn test_problem_details() {
        let problem = AppError::invalid_state("demand line already fully reserved")
            .to_problem_details()
            .with_instance("/allocations");

        assert_eq!(problem.status, 409);
        assert_eq!(problem.title, "Invalid State");
        assert_eq!(
            problem.r#type,
            "https://api.cuba-erp.com/problems/invalid-state"
        );
        assert!(problem.detail.contains("fully reserved"));

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["instance"], "/allocations");
    }
}
