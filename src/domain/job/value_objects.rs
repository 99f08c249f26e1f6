//! Job Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::JobFailure;

/// 提交令牌
///
/// 同一页面会话内单调递增；令牌与当前存活任务不一致的异步结果一律丢弃
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SubmissionToken(u64);

impl SubmissionToken {
    /// 会话开始时的令牌（尚无任何提交）
    pub fn initial() -> Self {
        Self(0)
    }

    /// 下一次提交使用的令牌
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 后端分配的任务句柄（不透明字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err("任务 ID 不能为空");
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 可播放媒体的定位符（视频 URL）
///
/// 不变量: 非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Result<Self, &'static str> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err("媒体地址不能为空");
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// 尚未提交
    Idle,
    /// 正在上传图片
    Submitting,
    /// 后端已受理，等待结果
    WaitingResult,
    /// 周期性查询状态中
    Polling,
    /// 已完成
    Succeeded,
    /// 失败
    Failed,
    /// 已取消
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Submitting => "submitting",
            JobState::WaitingResult => "waiting_result",
            JobState::Polling => "polling",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    /// 终止状态：进入后不再发生任何修改
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }

    /// 存活状态：已提交且尚未结束
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            JobState::Submitting | JobState::WaitingResult | JobState::Polling
        )
    }

    /// 状态迁移规则
    ///
    /// - Idle -> Submitting
    /// - Submitting -> Succeeded | Failed | WaitingResult
    /// - WaitingResult -> Polling | Failed
    /// - Polling -> Polling | Succeeded | Failed
    /// - 存活状态 -> Cancelled
    /// - 任意状态 -> Submitting（新提交总是抢占）
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;

        if next == Submitting {
            return true;
        }
        if next == Cancelled {
            return self.is_live();
        }
        matches!(
            (self, next),
            (Submitting, Succeeded)
                | (Submitting, Failed)
                | (Submitting, WaitingResult)
                | (WaitingResult, Polling)
                | (WaitingResult, Failed)
                | (Polling, Polling)
                | (Polling, Succeeded)
                | (Polling, Failed)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 待识别的图片
///
/// 不变量: 内容非空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, JobFailure> {
        if bytes.is_empty() {
            return Err(JobFailure::EmptyImage);
        }
        let file_name = file_name.into();
        let file_name = if file_name.trim().is_empty() {
            "image".to_string()
        } else {
            file_name
        };
        let content_type = content_type_for(&file_name).to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// 检查图片大小是否超出上限
    pub fn ensure_within(&self, max_size_bytes: u64) -> Result<(), JobFailure> {
        if self.size() > max_size_bytes {
            return Err(JobFailure::ImageTooLarge {
                size: self.size(),
                limit: max_size_bytes,
            });
        }
        Ok(())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 根据文件扩展名推断 MIME 类型
fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_monotonic() {
        let first = SubmissionToken::initial().next();
        let second = first.next();
        assert!(second > first);
        assert_eq!(first.value(), 1);
    }

    #[test]
    fn test_blank_ids_rejected() {
        assert!(JobId::new("  ").is_err());
        assert!(MediaRef::new("").is_err());
        assert_eq!(JobId::new(" job-42 ").unwrap().as_str(), "job-42");
    }

    #[test]
    fn test_transition_rules() {
        use JobState::*;
        assert!(Idle.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(WaitingResult));
        assert!(WaitingResult.can_transition_to(Polling));
        assert!(Polling.can_transition_to(Polling));
        assert!(Succeeded.can_transition_to(Submitting));
        assert!(!Idle.can_transition_to(Polling));
        assert!(!Submitting.can_transition_to(Polling));
        assert!(!Failed.can_transition_to(Succeeded));
        assert!(!Succeeded.can_transition_to(Cancelled));
        assert!(Polling.can_transition_to(Cancelled));
    }

    #[test]
    fn test_image_payload() {
        let image = ImagePayload::new("Albalad.JPG", vec![1, 2, 3]).unwrap();
        assert_eq!(image.content_type(), "image/jpeg");
        assert_eq!(image.size(), 3);
        assert!(image.ensure_within(3).is_ok());
        assert_eq!(
            image.ensure_within(2),
            Err(JobFailure::ImageTooLarge { size: 3, limit: 2 })
        );

        assert_eq!(ImagePayload::new("a.png", vec![]), Err(JobFailure::EmptyImage));
        let unnamed = ImagePayload::new("", vec![0]).unwrap();
        assert_eq!(unnamed.file_name(), "image");
        assert_eq!(unnamed.content_type(), "application/octet-stream");
    }
}
