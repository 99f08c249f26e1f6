//! Job Context - Errors

use thiserror::Error;

use super::JobState;

/// 启动任务失败且后端未给出 `detail` 时的提示
pub const GENERIC_START_FAILURE: &str = "Could not start the video job.";

/// 后端报告失败但未给出 `error` 时的提示
pub const GENERIC_JOB_FAILURE: &str = "Video generation failed.";

/// 领域规则违反（仅用于日志，不会展示给用户）
#[derive(Debug, Error)]
pub enum JobError {
    #[error("非法状态迁移: {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("任务已结束 ({0})，不可再修改")]
    AlreadyTerminal(JobState),
}

/// 任务失败原因
///
/// `Display` 即展示给用户的一行提示
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    #[error("Please select an image.")]
    NoImageSelected,

    #[error("The selected image is empty.")]
    EmptyImage,

    #[error("The selected image is too large.")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Failed to connect to server.")]
    SubmissionUnreachable,

    #[error("{message}")]
    SubmissionRejected { status: u16, message: String },

    #[error("Unexpected response from server: {0}")]
    SubmissionContract(String),

    #[error("Lost connection while checking the video status.")]
    PollUnreachable,

    #[error("{0}")]
    JobFailed(String),

    #[error("Malformed response: video finished without a video URL.")]
    MalformedSuccess,
}

impl JobFailure {
    /// 失败分类（用于日志字段）
    pub fn kind(&self) -> &'static str {
        match self {
            JobFailure::NoImageSelected
            | JobFailure::EmptyImage
            | JobFailure::ImageTooLarge { .. } => "input",
            JobFailure::SubmissionUnreachable | JobFailure::SubmissionRejected { .. } => {
                "submission_transport"
            }
            JobFailure::SubmissionContract(_) => "submission_contract",
            JobFailure::PollUnreachable => "poll_transport",
            JobFailure::JobFailed(_) => "job_failure",
            JobFailure::MalformedSuccess => "malformed_success",
        }
    }

    /// 是否为本地输入错误（发生在任何网络请求之前）
    pub fn is_input_error(&self) -> bool {
        self.kind() == "input"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            JobFailure::NoImageSelected.to_string(),
            "Please select an image."
        );
        assert_eq!(
            JobFailure::JobFailed("synthesis timeout".into()).to_string(),
            "synthesis timeout"
        );
        assert_eq!(
            JobFailure::SubmissionRejected {
                status: 500,
                message: GENERIC_START_FAILURE.into()
            }
            .to_string(),
            GENERIC_START_FAILURE
        );
    }

    #[test]
    fn test_kinds() {
        assert!(JobFailure::EmptyImage.is_input_error());
        assert!(!JobFailure::PollUnreachable.is_input_error());
        assert_eq!(JobFailure::MalformedSuccess.kind(), "malformed_success");
    }
}
