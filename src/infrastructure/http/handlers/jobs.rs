//! Job HTTP Handlers
//!
//! 页面表单提交、当前投影查询、取消

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::domain::{ImagePayload, JobFailure, Projection};
use crate::infrastructure::http::dto::{ApiResponse, CancelJobResponse, SubmitJobResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 提交图片（multipart）
///
/// 缺少图片字段时直接返回输入错误，不会请求后端
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<SubmitJobResponse>>, ApiError> {
    let limit = state.upload.max_size_bytes;
    let mut image: Option<ImagePayload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &headers, limit, "Failed to read multipart field"))?
    {
        if field.name() != Some(state.upload.field_name.as_str()) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, &headers, limit, "Failed to read image"))?;

        // 浏览器在未选择文件时仍会发送一个空的文件字段
        if data.is_empty() && file_name.is_empty() {
            continue;
        }
        image = Some(ImagePayload::new(file_name, data.to_vec())?);
    }

    // 在独立任务中执行，客户端断开时提交仍会走到终止状态
    let submitter = state.submitter.clone();
    let outcome = tokio::spawn(async move { submitter.submit(image).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Submission task failed: {}", e)))??;

    Ok(Json(ApiResponse::success(SubmitJobResponse {
        outcome: outcome.as_str(),
        projection: state.submitter.current(),
    })))
}

/// 请求体超过上限时按图片过大处理，其余读取错误为 400
fn multipart_error(
    error: MultipartError,
    headers: &HeaderMap,
    limit: u64,
    context: &str,
) -> ApiError {
    if error.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::BadRequest(format!("{}: {}", context, error));
    }

    // 未声明长度时只能确定超出上限
    let size = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or_else(|| limit.saturating_add(1));

    JobFailure::ImageTooLarge { size, limit }.into()
}

/// 当前任务投影
pub async fn current_job(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Projection>> {
    Json(ApiResponse::success(state.submitter.current()))
}

/// 取消当前任务
pub async fn cancel_job(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CancelJobResponse>> {
    let cancelled = state.submitter.cancel();
    Json(ApiResponse::success(CancelJobResponse {
        cancelled,
        projection: state.submitter.current(),
    }))
}
