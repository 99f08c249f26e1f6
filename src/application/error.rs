//! 应用层错误定义
//!
//! 仅用于外层接口（HTTP）；任务过程中的错误都已转为 Failed 状态

use thiserror::Error;

use crate::domain::JobFailure;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误（本地输入错误）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<JobFailure> for ApplicationError {
    fn from(failure: JobFailure) -> Self {
        if failure.is_input_error() {
            Self::ValidationError(failure.to_string())
        } else {
            Self::ExternalServiceError(failure.to_string())
        }
    }
}
