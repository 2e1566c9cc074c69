//! Sequential Upload Dispatcher: one multipart upload at a time, in queue order.
//!
//! File N+1 is not sent until the call for file N has resolved or rejected.
//! A failed upload is logged, recorded in its outcome, and the batch moves on.

use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::{error, info};

use crate::backend::BackendApi;
use crate::errors::IngestError;
use crate::models::{ItemId, UploadItem};

/// Result of one upload attempt.
#[derive(Debug)]
pub struct UploadOutcome {
    pub id: ItemId,
    pub file_name: String,
    pub result: Result<Value, IngestError>,
}

impl UploadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug)]
pub enum DispatchEvent {
    Started(ItemId),
    Finished(UploadOutcome),
}

pub struct UploadDispatcher {
    backend: Arc<dyn BackendApi>,
}

impl UploadDispatcher {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self { backend }
    }

    /// Emits `Started` then `Finished` for each item, strictly one item at a time.
    pub fn dispatch(&self, items: Vec<UploadItem>) -> impl Stream<Item = DispatchEvent> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let total = items.len();

        stream::unfold(
            (items.into_iter().enumerate(), None::<(usize, UploadItem)>),
            move |(mut rest, in_flight)| {
                let backend = Arc::clone(&backend);
                async move {
                    match in_flight {
                        None => {
                            let (index, item) = rest.next()?;
                            let id = item.id;
                            Some((DispatchEvent::Started(id), (rest, Some((index, item)))))
                        }
                        Some((index, item)) => {
                            let result = backend.upload_cv(&item.document).await;
                            match &result {
                                Ok(_) => info!(
                                    "Uploaded {} ({}/{total})",
                                    item.file_name(),
                                    index + 1
                                ),
                                Err(e) => error!(
                                    "Error uploading {} ({}/{total}): {e}",
                                    item.file_name(),
                                    index + 1
                                ),
                            }
                            let outcome = UploadOutcome {
                                id: item.id,
                                file_name: item.document.file_name,
                                result,
                            };
                            Some((DispatchEvent::Finished(outcome), (rest, None)))
                        }
                    }
                }
            },
        )
    }

    /// Uploads every item and returns one outcome per item, in queue order.
    pub async fn run(&self, items: Vec<UploadItem>) -> Vec<UploadOutcome> {
        self.dispatch(items)
            .filter_map(|event| async move {
                match event {
                    DispatchEvent::Finished(outcome) => Some(outcome),
                    DispatchEvent::Started(_) => None,
                }
            })
            .collect()
            .await
    }
}
