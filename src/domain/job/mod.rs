//! Job Context - 任务限界上下文
//!
//! 职责:
//! - 任务状态机（状态集合与迁移规则）
//! - 提交令牌、任务句柄、媒体定位符等值对象
//! - 失败分类与 UI 投影

mod aggregate;
mod errors;
mod projection;
mod value_objects;

pub use aggregate::Job;
pub use errors::{JobError, JobFailure, GENERIC_JOB_FAILURE, GENERIC_START_FAILURE};
pub use projection::{MediaView, Projection, DESCRIPTION_PLACEHOLDER};
pub use value_objects::{ImagePayload, JobId, JobState, MediaRef, SubmissionToken};
