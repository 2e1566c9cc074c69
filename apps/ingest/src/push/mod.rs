//! Push channel: server-to-client progress messages delivered outside the upload request.
//!
//! A subscription is a disposable handle: dropping it releases the underlying
//! receiver or connection, so every exit path of a batch tears it down.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::errors::IngestError;

pub mod broadcast;
pub mod sse;

pub use broadcast::BroadcastChannel;
pub use sse::SseChannel;

pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Opens topic subscriptions. One implementation per transport.
#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<Subscription, IngestError>;
}

/// An open subscription yielding raw message bodies.
/// `next()` returns `None` once the connection is gone.
pub struct Subscription {
    topic: String,
    messages: MessageStream,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, messages: impl Stream<Item = String> + Send + 'static) -> Self {
        let topic = topic.into();
        debug!("Opened push subscription on {topic}");
        Self {
            topic,
            messages: Box::pin(messages),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn next(&mut self) -> Option<String> {
        self.messages.next().await
    }

    /// Releases the subscription now instead of at end of scope.
    pub fn close(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("Released push subscription on {}", self.topic);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_subscription_yields_then_ends() {
        let mut sub = Subscription::new(
            "/topic/progress",
            stream::iter(vec!["one".to_string(), "two".to_string()]),
        );
        assert_eq!(sub.topic(), "/topic/progress");
        assert_eq!(sub.next().await.as_deref(), Some("one"));
        assert_eq!(sub.next().await.as_deref(), Some("two"));
        assert_eq!(sub.next().await, None);
    }
}
