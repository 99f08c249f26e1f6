//! Domain Layer - 领域层
//!
//! 只有一个限界上下文:
//! - Job Context: 图片识别 + 视频合成任务的生命周期

pub mod job;

pub use job::{
    ImagePayload, Job, JobError, JobFailure, JobId, JobState, MediaRef, MediaView, Projection,
    SubmissionToken,
};
