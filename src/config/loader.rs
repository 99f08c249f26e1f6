//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `LANDMARK_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `LANDMARK_SERVER__PORT=8080`
/// - `LANDMARK_BACKEND__BASE_URL=http://recognizer:8000`
/// - `LANDMARK_POLLING__INTERVAL_MS=1000`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("server.static_files.enabled", false)?
        .set_default("server.static_files.dir", "web")?
        .set_default("server.static_files.path", "/")?
        .set_default("backend.base_url", "http://localhost:8000")?
        .set_default("backend.upload_path", "/upload")?
        .set_default("backend.status_path", "/status")?
        .set_default("backend.timeout_secs", 60)?
        .set_default("polling.interval_ms", 3000)?
        .set_default("upload.max_size_bytes", 10 * 1024 * 1024)?
        .set_default("upload.field_name", "image")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("LANDMARK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.backend.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Backend URL cannot be empty".to_string(),
        ));
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Polling interval cannot be 0".to_string(),
        ));
    }

    if config.upload.max_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Upload size limit cannot be 0".to_string(),
        ));
    }

    if config.upload.field_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Upload field name cannot be empty".to_string(),
        ));
    }

    if config.server.static_files.enabled && config.server.static_files.path != "/" {
        return Err(ConfigError::ValidationError(format!(
            "Static files can only be served at \"/\", got {:?}",
            config.server.static_files.path
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if let Some(dir) = config.server.static_dir() {
        tracing::info!("Static Files: {:?}", dir);
    }
    tracing::info!("Backend URL: {}", config.backend.base_url);
    tracing::info!(
        "Backend Paths: {} / {}",
        config.backend.upload_path,
        config.backend.status_path
    );
    tracing::info!("Backend Timeout: {}s", config.backend.timeout_secs);
    tracing::info!("Poll Interval: {}ms", config.polling.interval_ms);
    tracing::info!("Max Upload Size: {} bytes", config.upload.max_size_bytes);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
