//! Application State
//!
//! 一个进程即一个页面会话：共享同一个 JobSubmitter 与投影发布器

use std::sync::Arc;

use crate::application::JobSubmitter;
use crate::infrastructure::events::ProjectionPublisher;

/// 上传设置
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// multipart 中图片字段名
    pub field_name: String,
    /// 图片大小上限（字节）
    pub max_size_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            field_name: "image".to_string(),
            max_size_bytes: 10 * 1024 * 1024,
        }
    }
}

/// 应用状态
pub struct AppState {
    pub submitter: Arc<JobSubmitter>,
    pub publisher: Arc<ProjectionPublisher>,
    pub upload: UploadSettings,
}

impl AppState {
    pub fn new(
        submitter: Arc<JobSubmitter>,
        publisher: Arc<ProjectionPublisher>,
        upload: UploadSettings,
    ) -> Self {
        Self {
            submitter,
            publisher,
            upload,
        }
    }
}
