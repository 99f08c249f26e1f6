//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod projection_sink;
mod recognition_backend;

pub use projection_sink::ProjectionSinkPort;
pub use recognition_backend::{
    BackendError, JobStatusBody, RecognitionBackendPort, StartJobBody, StartJobReply,
};
