//! HTTP Backend Client - 调用外部识别/视频合成服务
//!
//! 实现 RecognitionBackendPort trait
//!
//! 外部 API:
//! POST {base_url}/upload                multipart, 字段 `image`
//!   200: {"landmark_name", "description", "video_url"}
//!   202: {"video_id", "landmark_name"}
//!   其他: {"detail": "..."}（可选）
//! GET  {base_url}/status/{video_id}
//!   200: {"status", "video_url"?, "error"?}

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{
    BackendError, JobStatusBody, RecognitionBackendPort, StartJobBody, StartJobReply,
};
use crate::domain::{ImagePayload, JobId};

/// 错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// HTTP 后端客户端配置
#[derive(Debug, Clone)]
pub struct HttpBackendClientConfig {
    /// 后端基础 URL
    pub base_url: String,
    /// 上传（启动任务）路径
    pub upload_path: String,
    /// 状态查询路径前缀，实际请求 `{status_path}/{video_id}`
    pub status_path: String,
    /// multipart 中图片字段名
    pub field_name: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpBackendClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            upload_path: "/upload".to_string(),
            status_path: "/status".to_string(),
            field_name: "image".to_string(),
            timeout_secs: 60,
        }
    }
}

impl HttpBackendClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_paths(mut self, upload_path: impl Into<String>, status_path: impl Into<String>) -> Self {
        self.upload_path = upload_path.into();
        self.status_path = status_path.into();
        self
    }
}

/// HTTP 后端客户端
pub struct HttpBackendClient {
    client: Client,
    config: HttpBackendClientConfig,
    upload_url: Url,
    status_url: Url,
    health_url: Url,
}

impl HttpBackendClient {
    /// 创建新的 HTTP 后端客户端
    pub fn new(config: HttpBackendClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        let base = config.base_url.trim_end_matches('/');
        let upload_url = parse_url(&format!("{}{}", base, config.upload_path))?;
        let status_url = parse_url(&format!("{}{}", base, config.status_path))?;
        let health_url = parse_url(&format!("{}/health", base))?;

        if status_url.cannot_be_a_base() {
            return Err(BackendError::InvalidConfig(format!(
                "status URL cannot carry a job id: {}",
                status_url
            )));
        }

        Ok(Self {
            client,
            config,
            upload_url,
            status_url,
            health_url,
        })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, BackendError> {
        Self::new(HttpBackendClientConfig::default())
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// 获取某个任务的状态查询 URL（任务 ID 作为一个路径段编码）
    pub fn status_url(&self, job_id: &JobId) -> Url {
        let mut url = self.status_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(job_id.as_str());
        }
        url
    }

    async fn read_body(response: Response) -> Result<(u16, String), BackendError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::NetworkError(format!("Failed to read body: {}", e)))?;
        Ok((status, text))
    }
}

fn parse_url(raw: &str) -> Result<Url, BackendError> {
    Url::parse(raw).map_err(|e| BackendError::InvalidConfig(format!("{}: {}", raw, e)))
}

fn map_send_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::NetworkError(format!("Cannot connect to backend: {}", e))
    } else {
        BackendError::NetworkError(e.to_string())
    }
}

/// 非 2xx 响应：尽量取出 `detail`
fn status_error(status: u16, text: &str) -> BackendError {
    let detail = serde_json::from_str::<ErrorBody>(text)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
    BackendError::Status { status, detail }
}

#[async_trait]
impl RecognitionBackendPort for HttpBackendClient {
    async fn start_job(&self, image: &ImagePayload) -> Result<StartJobReply, BackendError> {
        let request_id = Uuid::new_v4();
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.content_type())
            .map_err(|e| BackendError::InvalidResponse(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part(self.config.field_name.clone(), part);

        tracing::debug!(
            url = %self.upload_url,
            request_id = %request_id,
            size = image.size(),
            "Sending start job request"
        );

        let response = self
            .client
            .post(self.upload_url.clone())
            .header("X-Request-Id", request_id.to_string())
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let (status, text) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &text));
        }

        let body: StartJobBody = serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("Malformed start response: {}", e)))?;

        tracing::info!(
            request_id = %request_id,
            status = status,
            video_id = ?body.video_id,
            landmark = ?body.landmark_name,
            "Start job response received"
        );

        Ok(StartJobReply { status, body })
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusBody, BackendError> {
        let url = self.status_url(job_id);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_send_error)?;

        let (status, text) = Self::read_body(response).await?;
        if !(200..300).contains(&status) {
            return Err(status_error(status, &text));
        }

        let body: JobStatusBody = serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("Malformed status response: {}", e)))?;

        tracing::debug!(url = %url, status = ?body.status, "Job status received");
        Ok(body)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url.clone())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpBackendClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.field_name, "image");
    }

    #[test]
    fn test_config_builder() {
        let config = HttpBackendClientConfig::new("http://example.com:9000/")
            .with_timeout(10)
            .with_paths("/api/upload", "/api/status/");
        let client = HttpBackendClient::new(config).unwrap();

        assert_eq!(client.upload_url().as_str(), "http://example.com:9000/api/upload");
        assert_eq!(
            client.status_url(&JobId::new("job-42").unwrap()).as_str(),
            "http://example.com:9000/api/status/job-42"
        );
    }

    #[test]
    fn test_status_url_encodes_job_id() {
        let client = HttpBackendClient::with_default_config().unwrap();
        let url = client.status_url(&JobId::new("a/b c").unwrap());
        assert_eq!(url.as_str(), "http://localhost:8000/status/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackendClient::new(HttpBackendClientConfig::new("not a url"));
        assert!(matches!(result, Err(BackendError::InvalidConfig(_))));
    }

    #[test]
    fn test_status_error_detail() {
        match status_error(400, r#"{"detail": "No landmark found"}"#) {
            BackendError::Status { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("No landmark found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match status_error(502, "<html>Bad Gateway</html>") {
            BackendError::Status { detail, .. } => assert!(detail.is_none()),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
