//! Response Classifier
//!
//! 把后端的各种响应形状归一化为两个统一结果:
//! - 启动任务 -> `SubmissionOutcome`
//! - 状态查询 -> `PollOutcome`

use crate::application::ports::{BackendError, JobStatusBody, StartJobReply};
use crate::domain::job::{GENERIC_JOB_FAILURE, GENERIC_START_FAILURE};
use crate::domain::{JobFailure, JobId, MediaRef};

/// 表示完成的状态值
const DONE_TOKENS: &[&str] = &["done", "completed", "succeeded", "success"];

/// 表示失败的状态值
const FAILED_TOKENS: &[&str] = &["failed", "error"];

/// 启动任务的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 后端同步返回了最终结果
    Completed {
        label: Option<String>,
        description: Option<String>,
        media: MediaRef,
    },
    /// 后端已受理，需要轮询
    Accepted {
        job_id: JobId,
        provisional_label: Option<String>,
    },
    /// 启动失败
    Failed(JobFailure),
    /// 响应到达时该次提交已被取代或取消，结果未生效
    Superseded,
}

impl SubmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionOutcome::Completed { .. } => "completed",
            SubmissionOutcome::Accepted { .. } => "accepted",
            SubmissionOutcome::Failed(_) => "failed",
            SubmissionOutcome::Superseded => "superseded",
        }
    }
}

/// 单次状态查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    StillRunning,
    Succeeded(MediaRef),
    Failed(JobFailure),
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::StillRunning)
    }
}

/// 归一化启动任务的响应
///
/// - 带 `video_id` 即为异步受理（不论 200 还是 202）
/// - 202 但缺少 `video_id` 属于契约错误
/// - 其余 2xx 必须带非空 `video_url`
pub fn classify_submission(reply: Result<StartJobReply, BackendError>) -> SubmissionOutcome {
    let reply = match reply {
        Ok(reply) => reply,
        Err(e) => return SubmissionOutcome::Failed(submission_failure(e)),
    };

    let accepted = reply.is_accepted();
    let body = reply.body;
    let label = non_empty(body.landmark_name);

    if let Some(video_id) = non_empty(body.video_id) {
        return match JobId::new(video_id) {
            Ok(job_id) => SubmissionOutcome::Accepted {
                job_id,
                provisional_label: label,
            },
            Err(_) => SubmissionOutcome::Failed(JobFailure::SubmissionContract(
                "missing video_id".to_string(),
            )),
        };
    }

    if accepted {
        return SubmissionOutcome::Failed(JobFailure::SubmissionContract(
            "missing video_id".to_string(),
        ));
    }

    match non_empty(body.video_url).map(MediaRef::new) {
        Some(Ok(media)) => SubmissionOutcome::Completed {
            label,
            description: non_empty(body.description),
            media,
        },
        _ => SubmissionOutcome::Failed(JobFailure::SubmissionContract(
            "missing video_url".to_string(),
        )),
    }
}

fn submission_failure(error: BackendError) -> JobFailure {
    match error {
        BackendError::Status { status, detail } => JobFailure::SubmissionRejected {
            status,
            message: non_empty(detail).unwrap_or_else(|| GENERIC_START_FAILURE.to_string()),
        },
        BackendError::InvalidResponse(_) => {
            JobFailure::SubmissionContract("response body could not be read".to_string())
        }
        BackendError::NetworkError(_) | BackendError::Timeout | BackendError::InvalidConfig(_) => {
            JobFailure::SubmissionUnreachable
        }
    }
}

/// 归一化一次状态查询（含传输失败）
///
/// 传输失败（网络、非 2xx、无法解析的响应体）一律视为终止性的连接错误
pub fn classify_poll(result: Result<JobStatusBody, BackendError>) -> PollOutcome {
    match result {
        Ok(body) => classify_status(&body),
        Err(_) => PollOutcome::Failed(JobFailure::PollUnreachable),
    }
}

/// 归一化状态查询的响应体
///
/// 未识别或缺失的状态值视为仍在处理；完成但缺少视频地址视为失败
pub fn classify_status(body: &JobStatusBody) -> PollOutcome {
    let token = body
        .status_token()
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if DONE_TOKENS.contains(&token.as_str()) {
        return match body.video_url.as_deref().map(MediaRef::new) {
            Some(Ok(media)) => PollOutcome::Succeeded(media),
            _ => PollOutcome::Failed(JobFailure::MalformedSuccess),
        };
    }

    if FAILED_TOKENS.contains(&token.as_str()) {
        let message = non_empty(body.error.clone()).unwrap_or_else(|| GENERIC_JOB_FAILURE.to_string());
        return PollOutcome::Failed(JobFailure::JobFailed(message));
    }

    PollOutcome::StillRunning
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
