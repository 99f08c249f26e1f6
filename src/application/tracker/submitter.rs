//! Job Submitter - 任务跟踪入口
//!
//! 编排 ResponseClassifier、JobStateMachine、PollingScheduler:
//! 上传图片 -> 同步结果直接完成，异步受理则开始轮询，失败立即进入 Failed

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ProjectionSinkPort, RecognitionBackendPort};
use crate::domain::{ImagePayload, Job, JobFailure, JobState, Projection, SubmissionToken};

use super::classifier::{classify_submission, SubmissionOutcome};
use super::scheduler::PollingScheduler;
use super::state_machine::JobStateMachine;

/// Submitter 配置
#[derive(Debug, Clone)]
pub struct JobSubmitterConfig {
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 图片大小上限（字节）
    pub max_image_bytes: u64,
}

impl Default for JobSubmitterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            max_image_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

/// 任务提交器
///
/// 每个页面会话一个实例；同一时刻最多一个存活任务
pub struct JobSubmitter {
    config: JobSubmitterConfig,
    backend: Arc<dyn RecognitionBackendPort>,
    machine: Arc<JobStateMachine>,
}

impl JobSubmitter {
    pub fn new(
        config: JobSubmitterConfig,
        backend: Arc<dyn RecognitionBackendPort>,
        sink: Arc<dyn ProjectionSinkPort>,
    ) -> Self {
        let scheduler = PollingScheduler::new(backend.clone());
        let machine = Arc::new(JobStateMachine::new(scheduler, sink));
        Self {
            config,
            backend,
            machine,
        }
    }

    /// 提交图片
    ///
    /// 未选择图片或图片无效时返回输入错误，不发出任何网络请求，也不影响当前任务。
    /// 其余所有错误都转为 Failed 状态，体现在返回的结果和投影中。
    /// 响应返回前该次提交已被新提交取代或被取消时返回 `Superseded`
    pub async fn submit(
        &self,
        image: Option<ImagePayload>,
    ) -> Result<SubmissionOutcome, JobFailure> {
        let image = image.ok_or(JobFailure::NoImageSelected)?;
        image.ensure_within(self.config.max_image_bytes)?;

        let token = self.machine.begin_submission();

        tracing::info!(
            token = %token,
            file_name = %image.file_name(),
            content_type = %image.content_type(),
            size = image.size(),
            "Submitting image"
        );

        let reply = self.backend.start_job(&image).await;
        let outcome = classify_submission(reply);

        let applied = match &outcome {
            SubmissionOutcome::Completed {
                label,
                description,
                media,
            } => {
                tracing::info!(token = %token, landmark = ?label, video_url = %media, "Job completed synchronously");
                self.machine
                    .complete(token, label.clone(), description.clone(), media.clone())
            }
            SubmissionOutcome::Accepted {
                job_id,
                provisional_label,
            } => {
                tracing::info!(token = %token, video_id = %job_id, landmark = ?provisional_label, "Job accepted");
                self.machine.accept(
                    token,
                    job_id.clone(),
                    provisional_label.clone(),
                    self.config.poll_interval,
                )
            }
            SubmissionOutcome::Failed(failure) => self.machine.fail(token, failure.clone()),
            SubmissionOutcome::Superseded => false,
        };

        if !applied {
            tracing::info!(
                token = %token,
                outcome = outcome.as_str(),
                live_token = %self.machine.current_token(),
                "Submission result arrived after the job was superseded"
            );
            return Ok(SubmissionOutcome::Superseded);
        }

        Ok(outcome)
    }

    /// 取消当前存活任务
    pub fn cancel(&self) -> bool {
        let cancelled = self.machine.cancel();
        if cancelled {
            tracing::info!(token = %self.machine.current_token(), "Job cancelled");
        }
        cancelled
    }

    /// 当前投影
    pub fn current(&self) -> Projection {
        self.machine.projection()
    }

    /// 当前任务快照
    pub fn job(&self) -> Job {
        self.machine.snapshot()
    }

    pub fn state(&self) -> JobState {
        self.machine.state()
    }

    pub fn current_token(&self) -> SubmissionToken {
        self.machine.current_token()
    }

    /// 是否有正在运行的轮询定时器
    pub fn is_polling(&self) -> bool {
        self.machine.is_polling()
    }

    /// 检查后端是否可用
    pub async fn backend_healthy(&self) -> bool {
        self.backend.health_check().await
    }

    /// 会话结束：停止轮询
    pub fn shutdown(&self) {
        self.machine.shutdown();
    }
}
