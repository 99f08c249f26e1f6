//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（RecognitionBackend、ProjectionSink）
//! - tracker: 异步任务生命周期跟踪（提交、轮询、状态机、响应归一化）
//! - error: 应用层错误定义

pub mod error;
pub mod ports;
pub mod tracker;

pub use error::ApplicationError;

pub use ports::{
    BackendError, JobStatusBody, ProjectionSinkPort, RecognitionBackendPort, StartJobBody,
    StartJobReply,
};

pub use tracker::{
    JobStateMachine, JobSubmitter, JobSubmitterConfig, PollControl, PollHandler, PollOutcome,
    PollingScheduler, SubmissionOutcome,
};
