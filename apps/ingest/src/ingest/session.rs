//! Batch workflow controller: `Idle → Uploading → Complete | Stalled`, `reset → Idle`.
//!
//! One push subscription is held for the lifetime of `run_batch` and released on
//! every exit path, including the future being dropped mid-batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::BackendApi;
use crate::config::Config;
use crate::errors::IngestError;
use crate::ingest::dispatcher::UploadDispatcher;
use crate::ingest::queue::UploadQueue;
use crate::ingest::tracker::{ItemReport, ProgressTracker};
use crate::models::{CvDocument, FileState, ItemId};
use crate::push::PushChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Idle,
    /// Uploading and waiting on the worker ("Analyzing").
    Uploading,
    Complete,
    /// Every upload was attempted but progress stopped: the push stream closed
    /// or went silent for the stall timeout. No reconnect is attempted.
    Stalled,
}

/// Latest observable state, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub phase: BatchPhase,
    pub overall_progress: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub phase: BatchPhase,
    pub overall_progress: u8,
    pub items: Vec<ItemReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.phase == BatchPhase::Complete
    }

    pub fn failed(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| i.state == FileState::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub topic: String,
    pub stall_timeout: Duration,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            topic: config.progress_topic.clone(),
            stall_timeout: config.stall_timeout,
        }
    }
}

/// Owns the queue and batch state for one client session.
pub struct IngestSession {
    backend: Arc<dyn BackendApi>,
    channel: Arc<dyn PushChannel>,
    options: SessionOptions,
    queue: UploadQueue,
    phase: BatchPhase,
    last_report: Option<BatchReport>,
    progress_tx: watch::Sender<BatchProgress>,
}

impl IngestSession {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        channel: Arc<dyn PushChannel>,
        options: SessionOptions,
    ) -> Self {
        let (progress_tx, _) = watch::channel(BatchProgress {
            phase: BatchPhase::Idle,
            overall_progress: 0,
        });
        Self {
            backend,
            channel,
            options,
            queue: UploadQueue::new(),
            phase: BatchPhase::Idle,
            last_report: None,
            progress_tx,
        }
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    /// Receiver for live progress, e.g. to drive a progress meter.
    pub fn watch(&self) -> watch::Receiver<BatchProgress> {
        self.progress_tx.subscribe()
    }

    pub fn add(&mut self, documents: impl IntoIterator<Item = CvDocument>) -> Result<Vec<ItemId>, IngestError> {
        self.ensure_idle("add files")?;
        Ok(self.queue.add(documents))
    }

    pub fn remove(&mut self, file_name: &str) -> Result<bool, IngestError> {
        self.ensure_idle("remove files")?;
        Ok(self.queue.remove(file_name))
    }

    /// Back to Idle: clears the queue and the previous batch.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.last_report = None;
        self.set_phase(BatchPhase::Idle, 0);
        info!("Ingest session reset");
    }

    /// Uploads the queued files and waits for the worker to finish them.
    pub async fn run_batch(&mut self) -> Result<BatchReport, IngestError> {
        self.ensure_idle("start a batch")?;
        if self.queue.is_empty() {
            return Err(IngestError::Validation("no files queued".to_string()));
        }

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        let items = self.queue.items().to_vec();
        let mut tracker = ProgressTracker::new(&items);

        // Released when this function returns or its future is dropped
        let mut subscription = self.channel.subscribe(&self.options.topic).await?;
        self.set_phase(BatchPhase::Uploading, 0);
        info!(
            "Batch {batch_id} started: {} file(s), {} bytes",
            items.len(),
            self.queue.total_bytes()
        );

        let stall_timeout = self.options.stall_timeout;
        let uploads = UploadDispatcher::new(Arc::clone(&self.backend)).dispatch(items);
        tokio::pin!(uploads);
        let stall = tokio::time::sleep(stall_timeout);
        tokio::pin!(stall);
        let mut uploads_done = false;
        let mut channel_open = true;

        let phase = loop {
            if uploads_done && tracker.is_complete() {
                break BatchPhase::Complete;
            }
            if uploads_done && !channel_open {
                warn!("Batch {batch_id} stalled: push channel closed before completion");
                break BatchPhase::Stalled;
            }

            tokio::select! {
                event = uploads.next(), if !uploads_done => match event {
                    Some(event) => {
                        tracker.apply_dispatch(event);
                        tracker.write_back(self.queue.items_mut());
                    }
                    None => {
                        uploads_done = true;
                        stall.as_mut().reset(Instant::now() + stall_timeout);
                    }
                },
                message = subscription.next(), if channel_open => match message {
                    Some(body) => {
                        if tracker.apply_message(&body) {
                            tracker.write_back(self.queue.items_mut());
                            stall.as_mut().reset(Instant::now() + stall_timeout);
                            self.publish_progress(tracker.overall_progress());
                        }
                    }
                    None => {
                        warn!("Push channel closed during batch {batch_id}");
                        channel_open = false;
                    }
                },
                () = &mut stall, if uploads_done => {
                    warn!(
                        "Batch {batch_id} stalled: no progress for {}s",
                        stall_timeout.as_secs()
                    );
                    break BatchPhase::Stalled;
                }
            }
        };
        subscription.close();

        let report = BatchReport {
            batch_id,
            phase,
            overall_progress: tracker.overall_progress(),
            items: tracker.items(),
            started_at,
            finished_at: Utc::now(),
        };
        self.set_phase(phase, report.overall_progress);
        info!(
            "Batch {batch_id} finished {:?} at {}% ({} failed upload(s))",
            phase,
            report.overall_progress,
            report.failed().count()
        );
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn ensure_idle(&self, action: &str) -> Result<(), IngestError> {
        if self.phase != BatchPhase::Idle {
            return Err(IngestError::InvalidState(format!(
                "cannot {action} while batch is {:?}; reset first",
                self.phase
            )));
        }
        Ok(())
    }

    fn set_phase(&mut self, phase: BatchPhase, overall_progress: u8) {
        self.phase = phase;
        self.progress_tx.send_replace(BatchProgress {
            phase,
            overall_progress,
        });
    }

    fn publish_progress(&self, overall_progress: u8) {
        self.progress_tx.send_modify(|p| p.overall_progress = overall_progress);
    }
}
