//! Ping Handler
//!
//! 健康检查，附带后端可用性

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// 识别后端是否可用
    pub backend: &'static str,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let backend = if state.submitter.backend_healthy().await {
        "up"
    } else {
        "down"
    };
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend,
    })
}
