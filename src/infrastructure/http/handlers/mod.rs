//! HTTP Handlers

mod jobs;
mod ping;
mod websocket;

pub use jobs::*;
pub use ping::*;
pub use websocket::*;
