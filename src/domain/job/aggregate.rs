//! Job Context - Aggregate Root

use chrono::{DateTime, Utc};

use super::{
    JobError, JobFailure, JobId, JobState, MediaRef, MediaView, Projection, SubmissionToken,
    DESCRIPTION_PLACEHOLDER,
};

/// Job 聚合根（一次图片识别 + 视频合成请求）
///
/// 不变量:
/// - `result` 存在当且仅当状态为 Succeeded
/// - `failure` 存在当且仅当状态为 Failed
/// - 终止状态下拒绝任何修改
#[derive(Debug, Clone)]
pub struct Job {
    token: SubmissionToken,
    id: Option<JobId>,
    state: JobState,
    subject_label: Option<String>,
    description: Option<String>,
    result: Option<MediaRef>,
    failure: Option<JobFailure>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// 会话初始状态
    pub fn idle() -> Self {
        Self {
            token: SubmissionToken::initial(),
            id: None,
            state: JobState::Idle,
            subject_label: None,
            description: None,
            result: None,
            failure: None,
            updated_at: Utc::now(),
        }
    }

    /// 新提交：创建处于 Submitting 的任务
    pub fn submitting(token: SubmissionToken) -> Self {
        Self {
            token,
            state: JobState::Submitting,
            ..Self::idle()
        }
    }

    /// 同步结果：Submitting -> Succeeded
    pub fn complete(
        &mut self,
        subject_label: Option<String>,
        description: Option<String>,
        media: MediaRef,
    ) -> Result<(), JobError> {
        self.check(JobState::Succeeded)?;
        if self.state != JobState::Submitting {
            return Err(JobError::InvalidTransition {
                from: self.state,
                to: JobState::Succeeded,
            });
        }
        self.subject_label = subject_label;
        self.description = description;
        self.result = Some(media);
        self.enter(JobState::Succeeded);
        Ok(())
    }

    /// 异步受理：Submitting -> WaitingResult
    pub fn accept(&mut self, id: JobId, provisional_label: Option<String>) -> Result<(), JobError> {
        self.check(JobState::WaitingResult)?;
        self.id = Some(id);
        if provisional_label.is_some() {
            self.subject_label = provisional_label;
        }
        self.enter(JobState::WaitingResult);
        Ok(())
    }

    /// WaitingResult -> Polling
    pub fn begin_polling(&mut self) -> Result<(), JobError> {
        self.check(JobState::Polling)?;
        self.enter(JobState::Polling);
        Ok(())
    }

    /// 轮询返回仍在处理：Polling -> Polling
    pub fn still_running(&mut self) -> Result<(), JobError> {
        self.check(JobState::Polling)?;
        self.enter(JobState::Polling);
        Ok(())
    }

    /// 轮询返回完成：Polling -> Succeeded
    pub fn succeed(&mut self, media: MediaRef) -> Result<(), JobError> {
        self.check(JobState::Succeeded)?;
        if self.state != JobState::Polling {
            return Err(JobError::InvalidTransition {
                from: self.state,
                to: JobState::Succeeded,
            });
        }
        self.result = Some(media);
        self.enter(JobState::Succeeded);
        Ok(())
    }

    /// 任意存活状态 -> Failed
    pub fn fail(&mut self, failure: JobFailure) -> Result<(), JobError> {
        self.check(JobState::Failed)?;
        self.failure = Some(failure);
        self.enter(JobState::Failed);
        Ok(())
    }

    /// 任意存活状态 -> Cancelled
    pub fn cancel(&mut self) -> Result<(), JobError> {
        self.check(JobState::Cancelled)?;
        self.enter(JobState::Cancelled);
        Ok(())
    }

    fn check(&self, next: JobState) -> Result<(), JobError> {
        if self.state.is_terminal() {
            return Err(JobError::AlreadyTerminal(self.state));
        }
        if !self.state.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        Ok(())
    }

    fn enter(&mut self, state: JobState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// 生成 UI 投影
    pub fn projection(&self) -> Projection {
        let description = match (&self.description, self.state.is_live()) {
            (Some(d), _) => Some(d.clone()),
            (None, true) => Some(DESCRIPTION_PLACEHOLDER.to_string()),
            (None, false) => None,
        };

        let media = match self.state {
            JobState::Idle | JobState::Cancelled => MediaView::Empty,
            JobState::Submitting | JobState::WaitingResult | JobState::Polling => {
                MediaView::Loading
            }
            JobState::Succeeded => match &self.result {
                Some(media) => MediaView::Ready {
                    url: media.as_str().to_string(),
                },
                None => MediaView::Empty,
            },
            JobState::Failed => MediaView::Error {
                message: self
                    .failure
                    .as_ref()
                    .map(|f| f.to_string())
                    .unwrap_or_default(),
            },
        };

        Projection {
            token: self.token.value(),
            state: self.state,
            name: self.subject_label.clone(),
            description,
            media,
            updated_at: self.updated_at,
        }
    }

    // Getters
    pub fn token(&self) -> SubmissionToken {
        self.token
    }

    pub fn id(&self) -> Option<&JobId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn subject_label(&self) -> Option<&str> {
        self.subject_label.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn result(&self) -> Option<&MediaRef> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    /// 失败详情（用户可读）
    pub fn error_detail(&self) -> Option<String> {
        self.failure.as_ref().map(|f| f.to_string())
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::idle()
    }
}
