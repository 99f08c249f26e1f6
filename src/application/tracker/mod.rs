//! Job Tracker - 异步任务生命周期跟踪
//!
//! 依赖顺序（叶子在前）:
//! - classifier: 后端响应归一化
//! - state_machine: 唯一存活 Job 的状态迁移与投影发布
//! - scheduler: 唯一的轮询定时器
//! - submitter: 编排以上三者

pub mod classifier;
mod scheduler;
mod state_machine;
mod submitter;

pub use classifier::{classify_poll, classify_status, classify_submission, PollOutcome, SubmissionOutcome};
pub use scheduler::{PollControl, PollHandler, PollingScheduler};
pub use state_machine::JobStateMachine;
pub use submitter::{JobSubmitter, JobSubmitterConfig};
