//! Job State Machine
//!
//! 持有会话内唯一的存活 Job 记录，所有状态修改都在这里发生:
//! - 每次修改都先比对提交令牌，令牌不一致的结果直接丢弃
//! - 进入终止状态时同步停止轮询
//! - 每次状态迁移后同步发布 UI 投影

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::application::ports::{BackendError, JobStatusBody, ProjectionSinkPort};
use crate::domain::{Job, JobError, JobFailure, JobId, JobState, MediaRef, Projection, SubmissionToken};

use super::classifier::{classify_poll, PollOutcome};
use super::scheduler::{PollControl, PollHandler, PollingScheduler};

pub struct JobStateMachine {
    job: Mutex<Job>,
    scheduler: PollingScheduler,
    sink: Arc<dyn ProjectionSinkPort>,
}

impl JobStateMachine {
    pub fn new(scheduler: PollingScheduler, sink: Arc<dyn ProjectionSinkPort>) -> Self {
        Self {
            job: Mutex::new(Job::idle()),
            scheduler,
            sink,
        }
    }

    /// 开始一次新提交：停止旧定时器，递增令牌，取代当前存活任务
    pub fn begin_submission(&self) -> SubmissionToken {
        let mut job = self.lock();
        self.scheduler.stop();

        let previous = job.state();
        let token = job.token().next();
        *job = Job::submitting(token);

        if previous.is_live() {
            tracing::info!(token = %token, previous_state = %previous, "Live job superseded");
        }
        self.emit(&job);
        token
    }

    /// 同步结果：Submitting -> Succeeded
    pub fn complete(
        &self,
        token: SubmissionToken,
        label: Option<String>,
        description: Option<String>,
        media: MediaRef,
    ) -> bool {
        self.apply(token, |job| job.complete(label, description, media))
    }

    /// 异步受理：Submitting -> WaitingResult -> Polling，并启动轮询
    pub fn accept(
        self: &Arc<Self>,
        token: SubmissionToken,
        job_id: JobId,
        provisional_label: Option<String>,
        interval: Duration,
    ) -> bool {
        let mut job = self.lock();
        if !self.is_current(&job, token) {
            return false;
        }

        if let Err(e) = job.accept(job_id.clone(), provisional_label) {
            self.reject(&job, token, &e);
            return false;
        }
        self.emit(&job);

        if let Err(e) = job.begin_polling() {
            self.reject(&job, token, &e);
            return false;
        }

        self.scheduler
            .start(job_id, token, interval, poll_handle(self));
        self.emit(&job);
        true
    }

    /// 任意存活状态 -> Failed
    pub fn fail(&self, token: SubmissionToken, failure: JobFailure) -> bool {
        let kind = failure.kind();
        let message = failure.to_string();
        let applied = self.apply(token, |job| job.fail(failure));
        if applied {
            tracing::warn!(token = %token, kind = kind, error = %message, "Job failed");
        }
        applied
    }

    /// 外部取消：存活任务 -> Cancelled。没有存活任务时返回 false
    pub fn cancel(&self) -> bool {
        let job = self.lock();
        if !job.state().is_live() {
            return false;
        }
        let token = job.token();
        drop(job);
        self.apply(token, |job| job.cancel())
    }

    /// 当前任务快照
    pub fn snapshot(&self) -> Job {
        self.lock().clone()
    }

    pub fn projection(&self) -> Projection {
        self.lock().projection()
    }

    pub fn state(&self) -> JobState {
        self.lock().state()
    }

    pub fn current_token(&self) -> SubmissionToken {
        self.lock().token()
    }

    /// 是否有正在运行的轮询定时器
    pub fn is_polling(&self) -> bool {
        self.scheduler.is_active()
    }

    /// 停止轮询（会话结束时调用）
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }

    /// 在令牌匹配时执行一次状态迁移
    fn apply<F>(&self, token: SubmissionToken, transition: F) -> bool
    where
        F: FnOnce(&mut Job) -> Result<(), JobError>,
    {
        let mut job = self.lock();
        if !self.is_current(&job, token) {
            return false;
        }

        if let Err(e) = transition(&mut job) {
            self.reject(&job, token, &e);
            return false;
        }

        if job.state().is_terminal() {
            self.scheduler.stop();
        }
        self.emit(&job);
        true
    }

    fn is_current(&self, job: &Job, token: SubmissionToken) -> bool {
        if job.token() != token {
            tracing::debug!(
                token = %token,
                live_token = %job.token(),
                "Discarding result for superseded submission"
            );
            return false;
        }
        true
    }

    fn reject(&self, job: &Job, token: SubmissionToken, error: &JobError) {
        tracing::debug!(token = %token, state = %job.state(), error = %error, "Transition rejected");
    }

    fn emit(&self, job: &Job) {
        tracing::debug!(
            token = %job.token(),
            state = %job.state(),
            video_id = ?job.id().map(|id| id.as_str()),
            "Job state changed"
        );
        self.sink.publish(job.projection());
    }

    fn lock(&self) -> MutexGuard<'_, Job> {
        self.job.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PollHandler for JobStateMachine {
    fn on_poll(
        &self,
        token: SubmissionToken,
        result: Result<JobStatusBody, BackendError>,
    ) -> PollControl {
        if let Err(e) = &result {
            tracing::warn!(token = %token, error = %e, "Status request failed");
        }

        let applied = match classify_poll(result) {
            PollOutcome::StillRunning => self.apply(token, |job| job.still_running()),
            PollOutcome::Succeeded(media) => {
                tracing::info!(token = %token, video_url = %media, "Video ready");
                self.apply(token, |job| job.succeed(media))
            }
            PollOutcome::Failed(failure) => self.fail(token, failure),
        };

        if applied && self.state() == JobState::Polling {
            PollControl::Continue
        } else {
            PollControl::Stop
        }
    }
}

/// 供调度器持有的弱引用
fn poll_handle(machine: &Arc<JobStateMachine>) -> Weak<dyn PollHandler> {
    let handler: Arc<dyn PollHandler> = machine.clone();
    Arc::downgrade(&handler)
}
