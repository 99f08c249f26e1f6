//! Projection Sink Port - UI 投影出口
//!
//! 核心只发出状态，不渲染任何标记；展示层通过此端口接收每一次状态变化

use crate::domain::Projection;

/// Projection Sink Port
///
/// 在状态迁移的同一步内同步调用，实现不得阻塞
pub trait ProjectionSinkPort: Send + Sync {
    fn publish(&self, projection: Projection);
}
