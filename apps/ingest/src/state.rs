use std::sync::Arc;

use crate::backend::{BackendApi, HttpBackend};
use crate::config::Config;
use crate::errors::IngestError;
use crate::ingest::{IngestSession, SessionOptions};
use crate::matching::MatchRequester;
use crate::push::{PushChannel, SseChannel};

/// Shared client state: configuration plus the two transports every workflow needs.
#[derive(Clone)]
pub struct ClientState {
    pub config: Config,
    pub backend: Arc<dyn BackendApi>,
    /// Push transport for progress events. Default: SSE against `events_url`.
    pub channel: Arc<dyn PushChannel>,
}

impl ClientState {
    pub fn from_config(config: Config) -> Result<Self, IngestError> {
        let backend = HttpBackend::new(config.api_url.clone(), config.request_timeout)?;
        let channel = SseChannel::new(config.events_url.clone(), config.request_timeout)?;
        Ok(Self {
            config,
            backend: Arc::new(backend),
            channel: Arc::new(channel),
        })
    }

    /// A fresh session with its own queue and batch state.
    pub fn session(&self) -> IngestSession {
        IngestSession::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.channel),
            SessionOptions::from(&self.config),
        )
    }

    pub fn matcher(&self) -> MatchRequester {
        MatchRequester::new(Arc::clone(&self.backend))
    }
}
