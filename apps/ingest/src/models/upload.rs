use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::document::CvDocument;

/// Identity of a queued file. Two files with the same name get distinct ids.
pub type ItemId = Uuid;

/// Per-file lifecycle, fed by two independent sources:
/// the upload HTTP response and the push-channel progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Queued,
    /// Upload request in flight.
    Uploading,
    /// Upload accepted, no progress reported yet.
    Uploaded,
    /// Worker reported progress below 100.
    Parsing,
    /// Worker reported 100.
    Parsed,
    /// Upload request failed and the worker never reported completion.
    Failed,
}

/// A file queued for upload. `progress` and `status` mirror the batch tracker
/// while a batch runs and keep their final values afterwards.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub id: ItemId,
    pub document: CvDocument,
    pub progress: f64,
    pub status: FileState,
}

impl UploadItem {
    pub fn new(document: CvDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            document,
            progress: 0.0,
            status: FileState::Queued,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.document.file_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.document.size_bytes()
    }
}
