//! Polling Scheduler
//!
//! 持有系统内唯一的轮询定时器:
//! - `start` 总是先 `stop`，新的轮询循环取代旧的
//! - `stop` 幂等，没有活动定时器时调用也安全
//! - 上一次状态请求返回后才会发出下一次请求，请求之间不会重叠

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::application::ports::{BackendError, JobStatusBody, RecognitionBackendPort};
use crate::domain::{JobId, SubmissionToken};

/// 处理完一次轮询结果后，轮询循环是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Stop,
}

/// 轮询结果的接收方
pub trait PollHandler: Send + Sync {
    /// 处理一次状态查询的结果，`token` 为启动该轮询循环时绑定的提交令牌
    fn on_poll(
        &self,
        token: SubmissionToken,
        result: Result<JobStatusBody, BackendError>,
    ) -> PollControl;
}

/// 当前活动的轮询循环
struct ActivePoll {
    job_id: JobId,
    token: SubmissionToken,
    handle: JoinHandle<()>,
}

/// 轮询调度器
pub struct PollingScheduler {
    backend: Arc<dyn RecognitionBackendPort>,
    active: Mutex<Option<ActivePoll>>,
}

impl PollingScheduler {
    pub fn new(backend: Arc<dyn RecognitionBackendPort>) -> Self {
        Self {
            backend,
            active: Mutex::new(None),
        }
    }

    /// 启动轮询循环
    ///
    /// 第一次查询在 `interval` 之后发出。处理方被释放或返回 `Stop` 时循环结束
    pub fn start(
        &self,
        job_id: JobId,
        token: SubmissionToken,
        interval: Duration,
        handler: Weak<dyn PollHandler>,
    ) {
        self.stop();

        let backend = self.backend.clone();
        let task_job_id = job_id.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                tracing::debug!(video_id = %task_job_id, token = %token, "Polling job status");
                let result = backend.job_status(&task_job_id).await;

                let Some(handler) = handler.upgrade() else {
                    break;
                };
                if handler.on_poll(token, result) == PollControl::Stop {
                    break;
                }
            }

            tracing::debug!(video_id = %task_job_id, token = %token, "Poll loop finished");
        });

        tracing::debug!(
            video_id = %job_id,
            token = %token,
            interval_ms = interval.as_millis() as u64,
            "Polling started"
        );

        *self.lock() = Some(ActivePoll {
            job_id,
            token,
            handle,
        });
    }

    /// 停止轮询循环（幂等）
    pub fn stop(&self) {
        if let Some(active) = self.lock().take() {
            active.handle.abort();
            tracing::debug!(
                video_id = %active.job_id,
                token = %active.token,
                "Polling stopped"
            );
        }
    }

    /// 是否有正在运行的轮询循环
    pub fn is_active(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|a| !a.handle.is_finished())
            .unwrap_or(false)
    }

    /// 当前轮询循环绑定的令牌
    pub fn active_token(&self) -> Option<SubmissionToken> {
        self.lock().as_ref().map(|a| a.token)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActivePoll>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScriptedBackendClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录收到的轮询结果，第 `stop_after` 次后停止
    struct CountingHandler {
        seen: AtomicUsize,
        stop_after: usize,
    }

    impl CountingHandler {
        fn new(stop_after: usize) -> Arc<Self> {
            Arc::new(Self {
                seen: AtomicUsize::new(0),
                stop_after,
            })
        }
    }

    impl PollHandler for CountingHandler {
        fn on_poll(
            &self,
            _token: SubmissionToken,
            _result: Result<JobStatusBody, BackendError>,
        ) -> PollControl {
            let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
            if seen >= self.stop_after {
                PollControl::Stop
            } else {
                PollControl::Continue
            }
        }
    }

    fn job(id: &str) -> JobId {
        JobId::new(id).unwrap()
    }

    fn weak(handler: &Arc<CountingHandler>) -> Weak<dyn PollHandler> {
        let handler: Arc<dyn PollHandler> = handler.clone();
        Arc::downgrade(&handler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_at_fixed_interval() {
        let backend = Arc::new(ScriptedBackendClient::new());
        let scheduler = PollingScheduler::new(backend.clone());
        let handler = CountingHandler::new(usize::MAX);

        scheduler.start(
            job("job-1"),
            SubmissionToken::initial().next(),
            Duration::from_millis(3000),
            weak(&handler),
        );

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(backend.status_requests(), 0);

        tokio::time::sleep(Duration::from_millis(6200)).await;
        assert_eq!(backend.status_requests(), 3);
        assert!(scheduler.is_active());

        scheduler.stop();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(backend.status_requests(), 3);
        assert!(!scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_supersedes_previous_loop() {
        let backend = Arc::new(ScriptedBackendClient::new());
        let scheduler = PollingScheduler::new(backend.clone());
        let handler = CountingHandler::new(usize::MAX);
        let first = SubmissionToken::initial().next();
        let second = first.next();

        scheduler.start(job("job-1"), first, Duration::from_millis(1000), weak(&handler));
        scheduler.start(job("job-2"), second, Duration::from_millis(1000), weak(&handler));
        assert_eq!(scheduler.active_token(), Some(second));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(backend.status_requests_for("job-1"), 0);
        assert_eq!(backend.status_requests_for("job-2"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_stop_ends_loop() {
        let backend = Arc::new(ScriptedBackendClient::new());
        let scheduler = PollingScheduler::new(backend.clone());
        let handler = CountingHandler::new(2);

        scheduler.start(
            job("job-1"),
            SubmissionToken::initial().next(),
            Duration::from_millis(500),
            weak(&handler),
        );

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(backend.status_requests(), 2);
        assert!(!scheduler.is_active());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let scheduler = PollingScheduler::new(Arc::new(ScriptedBackendClient::new()));
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_active());
        assert_eq!(scheduler.active_token(), None);
    }
}
