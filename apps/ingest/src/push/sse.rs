//! Server-sent-events push channel over a streaming `reqwest` response.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{PushChannel, Subscription};
use crate::errors::IngestError;

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

#[derive(Clone)]
pub struct SseChannel {
    client: Client,
    events_url: String,
}

impl SseChannel {
    /// The client has a connect timeout only: a total timeout would cut the stream.
    pub fn new(events_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, IngestError> {
        Ok(Self {
            client: Client::builder().connect_timeout(connect_timeout).build()?,
            events_url: events_url.into(),
        })
    }
}

#[async_trait]
impl PushChannel for SseChannel {
    async fn subscribe(&self, topic: &str) -> Result<Subscription, IngestError> {
        let response = self
            .client
            .get(&self.events_url)
            .query(&[("topic", topic)])
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IngestError::Api {
                status: status.as_u16(),
                message,
            });
        }

        info!("Connected to push channel {} ({topic})", self.events_url);
        Ok(Subscription::new(topic, sse_messages(Box::pin(response.bytes_stream()))))
    }
}

fn sse_messages(bytes: ByteStream) -> impl Stream<Item = String> + Send + 'static {
    stream::unfold(
        (bytes, SseDecoder::default(), VecDeque::new()),
        |(mut bytes, mut decoder, mut ready)| async move {
            loop {
                if let Some(message) = ready.pop_front() {
                    return Some((message, (bytes, decoder, ready)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.feed(&chunk)),
                    Some(Err(e)) => {
                        warn!("Push channel connection dropped: {e}");
                        return None;
                    }
                    None => {
                        debug!("Push channel stream ended");
                        return None;
                    }
                }
            }
        },
    )
}

/// Incremental `text/event-stream` decoder. Yields the `data` payload of each
/// complete frame; comments and other fields are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');

            if line.is_empty() {
                if !self.data.is_empty() {
                    frames.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        frames
    }
}
