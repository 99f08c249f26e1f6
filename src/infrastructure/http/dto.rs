//! Data Transfer Objects

use serde::Serialize;

use crate::domain::Projection;

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 提交结果
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    /// completed | accepted | failed | superseded
    pub outcome: &'static str,
    /// 提交完成时的投影
    pub projection: Projection,
}

/// 取消结果
#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub cancelled: bool,
    pub projection: Projection,
}
