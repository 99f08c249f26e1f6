//! Job Context - UI Projection
//!
//! 对外暴露的只读视图，展示层据此渲染加载中、最终视频或错误信息

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::JobState;

/// 描述尚未知晓时的占位文案
pub const DESCRIPTION_PLACEHOLDER: &str = "Generating your video...";

/// 媒体区域的展示内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaView {
    /// 无内容（尚未提交 / 已取消）
    Empty,
    /// 加载指示
    Loading,
    /// 可播放的视频
    Ready { url: String },
    /// 一行错误提示
    Error { message: String },
}

/// 任务投影
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub token: u64,
    pub state: JobState,
    pub name: Option<String>,
    /// 已知描述；存活期间未知时为占位文案，结束后仍未知则为 None
    pub description: Option<String>,
    pub media: MediaView,
    pub updated_at: DateTime<Utc>,
}

impl Projection {
    pub fn is_loading(&self) -> bool {
        self.media == MediaView::Loading
    }

    /// 视频地址（仅成功时存在）
    pub fn media_url(&self) -> Option<&str> {
        match &self.media {
            MediaView::Ready { url } => Some(url),
            _ => None,
        }
    }

    /// 错误提示（仅失败时存在）
    pub fn error_message(&self) -> Option<&str> {
        match &self.media {
            MediaView::Error { message } => Some(message),
            _ => None,
        }
    }
}
