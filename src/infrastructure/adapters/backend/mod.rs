//! Backend Adapter - 识别/视频合成后端客户端实现

mod http_backend_client;
mod scripted_backend_client;

pub use http_backend_client::*;
pub use scripted_backend_client::ScriptedBackendClient;
