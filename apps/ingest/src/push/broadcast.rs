//! In-process push channel backed by `tokio::sync::broadcast`, one sender per topic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::{PushChannel, Subscription};
use crate::errors::IngestError;

#[derive(Clone)]
pub struct BroadcastChannel {
    capacity: usize,
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl BroadcastChannel {
    /// # Arguments
    ///
    /// * `capacity` - messages buffered per topic before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn sender(&self, topic: &str) -> Result<broadcast::Sender<String>, IngestError> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|_| IngestError::PushChannel("topic registry poisoned".to_string()))?;
        Ok(topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone())
    }

    /// Publishes a message body. Returns the number of subscribers that received it.
    pub fn publish(&self, topic: &str, body: impl Into<String>) -> usize {
        match self.sender(topic) {
            Ok(tx) => tx.send(body.into()).unwrap_or(0),
            Err(e) => {
                warn!("Dropping message for {topic}: {e}");
                0
            }
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .ok()
            .and_then(|topics| topics.get(topic).map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }

    /// Drops the topic's sender, ending every open subscription on it.
    pub fn disconnect(&self, topic: &str) {
        if let Ok(mut topics) = self.topics.lock() {
            topics.remove(topic);
        }
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl PushChannel for BroadcastChannel {
    async fn subscribe(&self, topic: &str) -> Result<Subscription, IngestError> {
        let rx = self.sender(topic)?.subscribe();
        let messages = BroadcastStream::new(rx).filter_map(|result| async move {
            match result {
                Ok(body) => Some(body),
                Err(e) => {
                    // Lagged: some messages were overwritten, keep reading
                    warn!("Push subscriber lagged: {e}");
                    None
                }
            }
        });
        debug!("Broadcast subscriber added on {topic}");
        Ok(Subscription::new(topic, messages))
    }
}
