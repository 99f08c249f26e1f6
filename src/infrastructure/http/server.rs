//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::CONTENT_TYPE;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use super::routes::create_routes;
use super::state::AppState;

/// multipart 边界与其他字段预留的额外字节
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 静态页面目录（托管在 `/` 下），None 表示不托管
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5070,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 创建带默认配置的服务器
    pub fn with_default_config(state: AppState) -> Self {
        Self::new(ServerConfig::default(), state)
    }

    /// 构建 Router
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone(), self.config.static_dir.clone())
    }

    /// 启动服务器
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {}", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

/// 组装路由与中间件
pub fn build_router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([CONTENT_TYPE, REQUEST_ID_HEADER.clone()])
        .expose_headers([REQUEST_ID_HEADER.clone()])
        .max_age(std::time::Duration::from_secs(3600));

    let body_limit = usize::try_from(state.upload.max_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let mut router = create_routes();
    if let Some(dir) = static_dir {
        info!(dir = %dir.display(), "Serving static files");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::application::ports::{BackendError, StartJobReply};
    use crate::application::{JobSubmitter, JobSubmitterConfig};
    use crate::infrastructure::adapters::ScriptedBackendClient;
    use crate::infrastructure::events::ProjectionPublisher;
    use crate::infrastructure::http::state::UploadSettings;

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn router(backend: Arc<ScriptedBackendClient>) -> (Router, Arc<JobSubmitter>) {
        router_with_upload(backend, UploadSettings::default())
    }

    fn router_with_upload(
        backend: Arc<ScriptedBackendClient>,
        upload: UploadSettings,
    ) -> (Router, Arc<JobSubmitter>) {
        let publisher = Arc::new(ProjectionPublisher::new());
        let submitter = Arc::new(JobSubmitter::new(
            JobSubmitterConfig {
                max_image_bytes: upload.max_size_bytes,
                ..Default::default()
            },
            backend,
            publisher.clone(),
        ));
        let state = AppState::new(submitter.clone(), publisher, upload);
        (build_router(Arc::new(state), None), submitter)
    }

    fn multipart(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/jobs")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_current_job_starts_idle() {
        let (router, _) = router(Arc::new(ScriptedBackendClient::new()));

        let response = router
            .oneshot(Request::get("/api/jobs/current").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(&REQUEST_ID_HEADER));

        let json = read_json(response).await;
        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["state"], "idle");
        assert_eq!(json["data"]["media"]["kind"], "empty");
    }

    #[tokio::test]
    async fn test_submit_without_image_is_rejected() {
        let backend = Arc::new(ScriptedBackendClient::new());
        let (router, submitter) = router(backend.clone());

        let response = router
            .oneshot(multipart("other", "a.jpg", &[1, 2, 3]))
            .await
            .unwrap();
        let json = read_json(response).await;

        assert_eq!(json["errno"], 400);
        assert_eq!(json["error"], "Please select an image.");
        assert_eq!(backend.start_requests(), 0);
        assert_eq!(submitter.current_token().value(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_as_too_large() {
        let upload = UploadSettings {
            max_size_bytes: 1024,
            ..Default::default()
        };

        for size in [2048, 200 * 1024] {
            let backend = Arc::new(ScriptedBackendClient::new());
            let (router, _) = router_with_upload(backend.clone(), upload.clone());

            let response = router
                .oneshot(multipart("image", "big.jpg", &vec![0xAB; size]))
                .await
                .unwrap();
            let json = read_json(response).await;

            assert_eq!(json["errno"], 413, "size {}", size);
            assert_eq!(json["error"], "The selected image is too large.");
            assert_eq!(backend.start_requests(), 0);
        }
    }

    #[tokio::test]
    async fn test_submit_completed_job() {
        let backend = Arc::new(ScriptedBackendClient::new());
        backend.push_start(Ok(StartJobReply::completed(
            "Albalad",
            "Historic district of Jeddah",
            "https://cdn.example/albalad.mp4",
        )));
        let (router, _) = router(backend.clone());

        let response = router
            .oneshot(multipart("image", "albalad.jpg", &[0xFF, 0xD8, 0xFF]))
            .await
            .unwrap();
        let json = read_json(response).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["outcome"], "completed");
        assert_eq!(json["data"]["projection"]["state"], "succeeded");
        assert_eq!(json["data"]["projection"]["name"], "Albalad");
        assert_eq!(
            json["data"]["projection"]["media"]["url"],
            "https://cdn.example/albalad.mp4"
        );
        assert_eq!(backend.uploaded_files(), vec!["albalad.jpg"]);
    }

    #[tokio::test]
    async fn test_submit_backend_failure_is_reported_in_projection() {
        let backend = Arc::new(ScriptedBackendClient::new());
        backend.push_start(Err(BackendError::NetworkError("refused".into())));
        let (router, _) = router(backend);

        let response = router
            .oneshot(multipart("image", "a.jpg", &[1]))
            .await
            .unwrap();
        let json = read_json(response).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["outcome"], "failed");
        assert_eq!(
            json["data"]["projection"]["media"]["message"],
            "Failed to connect to server."
        );
    }

    #[tokio::test]
    async fn test_cancel_without_live_job() {
        let (router, _) = router(Arc::new(ScriptedBackendClient::new()));

        let response = router
            .oneshot(
                Request::post("/api/jobs/cancel")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = read_json(response).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["cancelled"], false);
    }
}
