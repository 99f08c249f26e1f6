//! Projection Publisher Implementation
//!
//! 把任务投影推送给展示层（WebSocket 订阅者），并保留最新一份快照

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::application::ports::ProjectionSinkPort;
use crate::domain::Projection;

/// 广播通道容量
const CHANNEL_CAPACITY: usize = 100;

/// 投影发布器
pub struct ProjectionPublisher {
    channel: broadcast::Sender<Projection>,
    latest: Mutex<Option<Projection>>,
}

impl ProjectionPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            channel: tx,
            latest: Mutex::new(None),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅后续的投影
    pub fn subscribe(&self) -> broadcast::Receiver<Projection> {
        self.channel.subscribe()
    }

    /// 最近一次发布的投影
    pub fn latest(&self) -> Option<Projection> {
        self.lock().clone()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.channel.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Projection>> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ProjectionPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionSinkPort for ProjectionPublisher {
    fn publish(&self, projection: Projection) {
        *self.lock() = Some(projection.clone());

        if let Err(e) = self.channel.send(projection) {
            tracing::trace!(error = %e, "Projection not delivered (no subscribers)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Job;

    #[tokio::test]
    async fn test_publish_without_subscribers_keeps_latest() {
        let publisher = ProjectionPublisher::new();
        assert!(publisher.latest().is_none());

        let projection = Job::idle().projection();
        publisher.publish(projection.clone());
        assert_eq!(publisher.latest(), Some(projection));
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let publisher = ProjectionPublisher::new().arc();
        let mut rx = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        let first = Job::idle().projection();
        let second = Job::submitting(crate::domain::SubmissionToken::initial().next()).projection();
        publisher.publish(first.clone());
        publisher.publish(second.clone());

        assert_eq!(rx.recv().await.unwrap(), first);
        assert_eq!(rx.recv().await.unwrap(), second);
    }
}
