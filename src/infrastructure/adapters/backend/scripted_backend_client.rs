//! Scripted Backend Client - 用于测试的后端
//!
//! 按预设脚本依次返回响应，不实际发出网络请求，并记录每一次调用

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::application::ports::{
    BackendError, JobStatusBody, RecognitionBackendPort, StartJobReply,
};
use crate::domain::{ImagePayload, JobId};

/// 一条脚本：延迟后返回结果
struct Step<T> {
    delay: Duration,
    reply: Result<T, BackendError>,
}

#[derive(Default)]
struct Script {
    starts: VecDeque<Step<StartJobReply>>,
    statuses: HashMap<String, VecDeque<Step<JobStatusBody>>>,
    status_calls: HashMap<String, usize>,
    uploaded: Vec<String>,
}

/// Scripted Backend Client
///
/// - 启动脚本耗尽时返回网络错误
/// - 状态脚本耗尽时返回 `processing`
pub struct ScriptedBackendClient {
    script: Mutex<Script>,
    start_requests: AtomicUsize,
    status_requests: AtomicUsize,
}

impl ScriptedBackendClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            start_requests: AtomicUsize::new(0),
            status_requests: AtomicUsize::new(0),
        }
    }

    /// 追加一条启动任务响应
    pub fn push_start(&self, reply: Result<StartJobReply, BackendError>) -> &Self {
        self.push_start_after(Duration::ZERO, reply)
    }

    /// 追加一条延迟返回的启动任务响应
    pub fn push_start_after(
        &self,
        delay: Duration,
        reply: Result<StartJobReply, BackendError>,
    ) -> &Self {
        self.lock().starts.push_back(Step { delay, reply });
        self
    }

    /// 为某个任务追加一条状态响应
    pub fn push_status(&self, job_id: &str, reply: Result<JobStatusBody, BackendError>) -> &Self {
        self.push_status_after(job_id, Duration::ZERO, reply)
    }

    /// 为某个任务追加一条延迟返回的状态响应
    pub fn push_status_after(
        &self,
        job_id: &str,
        delay: Duration,
        reply: Result<JobStatusBody, BackendError>,
    ) -> &Self {
        self.lock()
            .statuses
            .entry(job_id.to_string())
            .or_default()
            .push_back(Step { delay, reply });
        self
    }

    /// 已发出的启动任务请求数
    pub fn start_requests(&self) -> usize {
        self.start_requests.load(Ordering::SeqCst)
    }

    /// 已发出的状态查询请求数（所有任务）
    pub fn status_requests(&self) -> usize {
        self.status_requests.load(Ordering::SeqCst)
    }

    /// 某个任务的状态查询请求数
    pub fn status_requests_for(&self, job_id: &str) -> usize {
        self.lock().status_calls.get(job_id).copied().unwrap_or(0)
    }

    /// 已上传图片的文件名（按顺序）
    pub fn uploaded_files(&self) -> Vec<String> {
        self.lock().uploaded.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ScriptedBackendClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionBackendPort for ScriptedBackendClient {
    async fn start_job(&self, image: &ImagePayload) -> Result<StartJobReply, BackendError> {
        self.start_requests.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut script = self.lock();
            script.uploaded.push(image.file_name().to_string());
            script.starts.pop_front()
        };

        let Some(step) = step else {
            return Err(BackendError::NetworkError("no scripted reply".to_string()));
        };

        tracing::debug!(
            file_name = %image.file_name(),
            delay_ms = step.delay.as_millis() as u64,
            "ScriptedBackendClient: start job"
        );

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.reply
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusBody, BackendError> {
        self.status_requests.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut script = self.lock();
            *script
                .status_calls
                .entry(job_id.as_str().to_string())
                .or_default() += 1;
            script
                .statuses
                .get_mut(job_id.as_str())
                .and_then(|steps| steps.pop_front())
        };

        let Some(step) = step else {
            return Ok(JobStatusBody::processing());
        };

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order() {
        let backend = ScriptedBackendClient::new();
        backend
            .push_start(Ok(StartJobReply::accepted("job-1", "Almasmak")))
            .push_status("job-1", Ok(JobStatusBody::done("https://cdn.example/b.mp4")));

        let image = ImagePayload::new("a.jpg", vec![1]).unwrap();
        let reply = backend.start_job(&image).await.unwrap();
        assert!(reply.is_accepted());
        assert!(backend.start_job(&image).await.is_err());

        let job = JobId::new("job-1").unwrap();
        let body = backend.job_status(&job).await.unwrap();
        assert_eq!(body.status_token(), Some("done"));
        let body = backend.job_status(&job).await.unwrap();
        assert_eq!(body.status_token(), Some("processing"));

        assert_eq!(backend.start_requests(), 2);
        assert_eq!(backend.status_requests_for("job-1"), 2);
        assert_eq!(backend.uploaded_files(), vec!["a.jpg", "a.jpg"]);
    }
}
