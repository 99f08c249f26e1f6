//! Landmark Tracker - 地标识别 + 视频合成任务跟踪服务

use std::sync::Arc;

use landmark_tracker::application::{JobSubmitter, JobSubmitterConfig, RecognitionBackendPort};
use landmark_tracker::config::{load_config, print_config, AppConfig};
use landmark_tracker::infrastructure::adapters::{HttpBackendClient, HttpBackendClientConfig};
use landmark_tracker::infrastructure::events::ProjectionPublisher;
use landmark_tracker::infrastructure::http::{AppState, HttpServer, ServerConfig, UploadSettings};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},landmark_tracker={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Landmark Tracker v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // 创建后端客户端
    let backend_config = HttpBackendClientConfig {
        base_url: config.backend.base_url.clone(),
        upload_path: config.backend.upload_path.clone(),
        status_path: config.backend.status_path.clone(),
        field_name: config.upload.field_name.clone(),
        timeout_secs: config.backend.timeout_secs,
    };
    let backend = Arc::new(
        HttpBackendClient::new(backend_config)
            .map_err(|e| anyhow::anyhow!("Failed to create backend client: {}", e))?,
    );

    if backend.health_check().await {
        tracing::info!(url = %config.backend.base_url, "Backend is reachable");
    } else {
        tracing::warn!(url = %config.backend.base_url, "Backend health check failed, continuing anyway");
    }

    // 投影发布器 + 任务提交器
    let publisher = ProjectionPublisher::new().arc();
    let submitter = Arc::new(JobSubmitter::new(
        JobSubmitterConfig {
            poll_interval: config.polling.interval(),
            max_image_bytes: config.upload.max_size_bytes,
        },
        backend,
        publisher.clone(),
    ));

    // 创建 HTTP 服务器
    let mut server_config = ServerConfig::new(&config.server.host, config.server.port);
    if let Some(dir) = config.server.static_dir() {
        server_config = server_config.with_static_dir(dir);
    }
    let state = AppState::new(
        submitter.clone(),
        publisher,
        UploadSettings {
            field_name: config.upload.field_name.clone(),
            max_size_bytes: config.upload.max_size_bytes,
        },
    );

    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    submitter.shutdown();
    tracing::info!("Server shutdown complete");

    Ok(())
}

