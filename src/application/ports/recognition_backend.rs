//! Recognition Backend Port - 识别/视频合成后端抽象
//!
//! 定义启动任务和查询任务状态两个接口，具体实现在 infrastructure/adapters 层
//!
//! 后端返回的结构体保持"宽松"：所有字段可缺省，形状归一化交给 ResponseClassifier

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{ImagePayload, JobId};

/// 后端错误
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

/// 启动任务接口的响应体
///
/// 同时兼容两种后端形状:
/// - `{landmark_name, description, video_url}` / `{landmark_name, video_id}`
/// - 早期页面使用的 `{name, description, videoUrl}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StartJobBody {
    #[serde(default, alias = "name")]
    pub landmark_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,

    #[serde(default, alias = "videoId")]
    pub video_id: Option<String>,
}

/// 启动任务接口的成功响应（2xx）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartJobReply {
    /// HTTP 状态码
    pub status: u16,
    pub body: StartJobBody,
}

impl StartJobReply {
    /// 202：后端已受理，需要轮询
    pub fn is_accepted(&self) -> bool {
        self.status == 202
    }

    /// 同步完成的响应
    pub fn completed(
        landmark_name: impl Into<String>,
        description: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        Self {
            status: 200,
            body: StartJobBody {
                landmark_name: Some(landmark_name.into()),
                description: Some(description.into()),
                video_url: Some(video_url.into()),
                video_id: None,
            },
        }
    }

    /// 异步受理的响应
    pub fn accepted(video_id: impl Into<String>, landmark_name: impl Into<String>) -> Self {
        Self {
            status: 202,
            body: StartJobBody {
                landmark_name: Some(landmark_name.into()),
                description: None,
                video_url: None,
                video_id: Some(video_id.into()),
            },
        }
    }
}

/// 状态查询接口的响应体
///
/// `status` 保留原始 JSON 值：非字符串或缺失都视为"仍在处理"
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobStatusBody {
    #[serde(default)]
    pub status: Option<serde_json::Value>,

    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusBody {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(serde_json::Value::String(status.into())),
            ..Default::default()
        }
    }

    pub fn processing() -> Self {
        Self::with_status("processing")
    }

    pub fn done(video_url: impl Into<String>) -> Self {
        Self {
            video_url: Some(video_url.into()),
            ..Self::with_status("done")
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status("failed")
        }
    }

    /// 状态字段的字符串形式
    pub fn status_token(&self) -> Option<&str> {
        self.status.as_ref().and_then(|v| v.as_str())
    }
}

/// Recognition Backend Port
///
/// 外部识别/视频合成服务的抽象接口
#[async_trait]
pub trait RecognitionBackendPort: Send + Sync {
    /// 上传图片并启动任务
    ///
    /// 2xx 返回 `Ok`，其他状态码返回 `BackendError::Status`
    async fn start_job(&self, image: &ImagePayload) -> Result<StartJobReply, BackendError>;

    /// 查询任务状态
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusBody, BackendError>;

    /// 检查后端是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_body_accepts_legacy_shape() {
        let body: StartJobBody = serde_json::from_str(
            r#"{"name": "Albalad", "description": "Old town", "videoUrl": "https://cdn.example/a.mp4"}"#,
        )
        .unwrap();
        assert_eq!(body.landmark_name.as_deref(), Some("Albalad"));
        assert_eq!(body.video_url.as_deref(), Some("https://cdn.example/a.mp4"));
        assert!(body.video_id.is_none());
    }

    #[test]
    fn test_status_body_tolerates_odd_status() {
        let body: JobStatusBody = serde_json::from_str(r#"{"status": 7}"#).unwrap();
        assert_eq!(body.status_token(), None);

        let body: JobStatusBody = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.status.is_none());

        assert_eq!(JobStatusBody::done("u").status_token(), Some("done"));
    }
}
