//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查（含后端可用性）
//! - /api/jobs              POST  提交图片（multipart 字段 `image`）
//! - /api/jobs/current      GET   当前任务投影
//! - /api/jobs/cancel       POST  取消当前任务
//! - /ws/projections        WS    投影推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/projections", get(handlers::projection_socket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/jobs", job_routes())
}

/// Job 路由
fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::submit_job))
        .route("/current", get(handlers::current_job))
        .route("/cancel", post(handlers::cancel_job))
}
