//! Landmark Tracker - 地标识别 + 视频合成任务跟踪
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Job Context: 任务状态、提交令牌、失败原因、UI 投影
//!
//! 应用层 (application/):
//! - Ports: 端口定义（RecognitionBackend, ProjectionSink）
//! - Tracker: JobSubmitter, PollingScheduler, JobStateMachine, ResponseClassifier
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket 投影推送
//! - Adapters: HTTP 后端客户端，脚本化测试后端
//! - Events: 投影广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
