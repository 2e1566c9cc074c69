//! Progress tracking for one batch.
//!
//! Each file's state combines two independent sources: the upload HTTP outcome
//! (from the dispatcher) and the worker's progress events (from the push channel).
//! Overall progress is averaged over every file of the batch; a file that has not
//! reported yet counts as 0.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ingest::dispatcher::{DispatchEvent, UploadOutcome};
use crate::models::{FileState, ItemId, ProgressEvent, UploadItem};

#[derive(Debug, Clone, PartialEq)]
enum Transport {
    Pending,
    InFlight,
    Accepted,
    Rejected(String),
}

#[derive(Debug, Clone)]
struct TrackedFile {
    id: ItemId,
    file_name: String,
    size_bytes: u64,
    progress: f64,
    reported: bool,
    transport: Transport,
    record: Option<Value>,
}

impl TrackedFile {
    fn state(&self) -> FileState {
        if self.progress >= 100.0 {
            return FileState::Parsed;
        }
        match self.transport {
            Transport::Rejected(_) => FileState::Failed,
            _ if self.reported => FileState::Parsing,
            Transport::Accepted => FileState::Uploaded,
            Transport::InFlight => FileState::Uploading,
            Transport::Pending => FileState::Queued,
        }
    }
}

/// Per-file view exposed in batch reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub id: ItemId,
    pub file_name: String,
    pub size_bytes: u64,
    pub state: FileState,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    files: Vec<TrackedFile>,
}

impl ProgressTracker {
    pub fn new(items: &[UploadItem]) -> Self {
        Self {
            files: items
                .iter()
                .map(|item| TrackedFile {
                    id: item.id,
                    file_name: item.file_name().to_string(),
                    size_bytes: item.size_bytes(),
                    progress: 0.0,
                    reported: false,
                    transport: Transport::Pending,
                    record: None,
                })
                .collect(),
        }
    }

    fn file_mut(&mut self, id: ItemId) -> Option<&mut TrackedFile> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    pub fn apply_dispatch(&mut self, event: DispatchEvent) {
        match event {
            DispatchEvent::Started(id) => {
                if let Some(file) = self.file_mut(id) {
                    file.transport = Transport::InFlight;
                }
            }
            DispatchEvent::Finished(outcome) => self.record_upload(outcome),
        }
    }

    pub fn record_upload(&mut self, outcome: UploadOutcome) {
        let Some(file) = self.file_mut(outcome.id) else {
            warn!("Upload outcome for unknown item {}", outcome.id);
            return;
        };
        match outcome.result {
            Ok(record) => {
                file.transport = Transport::Accepted;
                file.record = Some(record);
            }
            Err(e) => file.transport = Transport::Rejected(e.to_string()),
        }
    }

    /// Parses and applies one raw push message. Malformed messages are ignored.
    /// Returns true when the message updated at least one file.
    pub fn apply_message(&mut self, body: &str) -> bool {
        match ProgressEvent::parse(body) {
            Ok(event) => self.apply_progress(&event),
            Err(e) => {
                warn!("Ignoring malformed progress message: {e}");
                false
            }
        }
    }

    /// Applies a progress event to every file with that name.
    /// Progress never moves backwards.
    pub fn apply_progress(&mut self, event: &ProgressEvent) -> bool {
        let percent = event.percent();
        let mut matched = false;

        for file in self.files.iter_mut().filter(|f| f.file_name == event.file_name) {
            matched = true;
            file.reported = true;
            if percent < file.progress {
                debug!(
                    "Ignoring progress regression for {}: {} -> {percent}",
                    file.file_name, file.progress
                );
                continue;
            }
            file.progress = percent;
        }

        if !matched {
            warn!("Progress event for file not in this batch: {}", event.file_name);
        }
        matched
    }

    /// `round(mean(progress))` over the whole batch.
    pub fn overall_progress(&self) -> u8 {
        if self.files.is_empty() {
            return 0;
        }
        let sum: f64 = self.files.iter().map(|f| f.progress).sum();
        (sum / self.files.len() as f64).round() as u8
    }

    /// Every file of the batch reported 100.
    pub fn is_complete(&self) -> bool {
        !self.files.is_empty() && self.files.iter().all(|f| f.progress >= 100.0)
    }

    pub fn state_of(&self, id: ItemId) -> Option<FileState> {
        self.files.iter().find(|f| f.id == id).map(|f| f.state())
    }

    /// Copies each file's progress and state onto the matching queue item.
    pub fn write_back(&self, items: &mut [UploadItem]) {
        for item in items.iter_mut() {
            if let Some(file) = self.files.iter().find(|f| f.id == item.id) {
                item.progress = file.progress;
                item.status = file.state();
            }
        }
    }

    pub fn items(&self) -> Vec<ItemReport> {
        self.files
            .iter()
            .map(|f| ItemReport {
                id: f.id,
                file_name: f.file_name.clone(),
                size_bytes: f.size_bytes,
                state: f.state(),
                progress: f.progress,
                error: match &f.transport {
                    Transport::Rejected(reason) => Some(reason.clone()),
                    _ => None,
                },
                record: f.record.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IngestError;
    use crate::models::CvDocument;
    use serde_json::json;

    fn batch(names: &[&str]) -> (ProgressTracker, Vec<ItemId>) {
        let items: Vec<UploadItem> = names
            .iter()
            .map(|n| UploadItem::new(CvDocument::new(*n, vec![0u8; 2]).unwrap()))
            .collect();
        let ids = items.iter().map(|i| i.id).collect();
        (ProgressTracker::new(&items), ids)
    }

    fn progress(name: &str, value: f64) -> ProgressEvent {
        ProgressEvent {
            file_name: name.to_string(),
            progress: value,
        }
    }

    fn ok(id: ItemId) -> UploadOutcome {
        UploadOutcome {
            id,
            file_name: String::new(),
            result: Ok(json!({})),
        }
    }

    fn failed(id: ItemId) -> UploadOutcome {
        UploadOutcome {
            id,
            file_name: String::new(),
            result: Err(IngestError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        }
    }

    #[test]
    fn test_mean_of_latest_progress() {
        let (mut tracker, _) = batch(&["a.pdf", "b.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 50.0));
        tracker.apply_progress(&progress("b.pdf", 100.0));
        assert_eq!(tracker.overall_progress(), 75);
    }

    #[test]
    fn test_unreported_files_count_as_zero() {
        let (mut tracker, _) = batch(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 100.0));
        assert_eq!(tracker.overall_progress(), 25);
    }

    #[test]
    fn test_overall_progress_rounds() {
        let (mut tracker, _) = batch(&["a.pdf", "b.pdf", "c.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 100.0));
        tracker.apply_progress(&progress("b.pdf", 100.0));
        // 200 / 3 = 66.67
        assert_eq!(tracker.overall_progress(), 67);
    }

    #[test]
    fn test_two_of_three_at_100_is_not_complete() {
        let (mut tracker, _) = batch(&["a.pdf", "b.pdf", "c.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 100.0));
        tracker.apply_progress(&progress("b.pdf", 100.0));
        assert!(!tracker.is_complete());

        tracker.apply_progress(&progress("c.pdf", 100.0));
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_http_success_without_progress_is_not_complete() {
        let (mut tracker, ids) = batch(&["a.pdf"]);
        tracker.record_upload(ok(ids[0]));
        assert_eq!(tracker.state_of(ids[0]), Some(FileState::Uploaded));
        assert!(!tracker.is_complete());
    }

    #[test]
    fn test_state_machine_transitions() {
        let (mut tracker, ids) = batch(&["a.pdf"]);
        let id = ids[0];
        assert_eq!(tracker.state_of(id), Some(FileState::Queued));

        tracker.apply_dispatch(DispatchEvent::Started(id));
        assert_eq!(tracker.state_of(id), Some(FileState::Uploading));

        // Worker can report before the HTTP call resolves
        tracker.apply_progress(&progress("a.pdf", 30.0));
        assert_eq!(tracker.state_of(id), Some(FileState::Parsing));

        tracker.apply_dispatch(DispatchEvent::Finished(ok(id)));
        assert_eq!(tracker.state_of(id), Some(FileState::Parsing));

        tracker.apply_progress(&progress("a.pdf", 100.0));
        assert_eq!(tracker.state_of(id), Some(FileState::Parsed));
    }

    #[test]
    fn test_rejected_upload_is_failed_until_worker_finishes() {
        let (mut tracker, ids) = batch(&["a.pdf"]);
        tracker.record_upload(failed(ids[0]));
        assert_eq!(tracker.state_of(ids[0]), Some(FileState::Failed));
        assert_eq!(tracker.items()[0].error.as_deref(), Some("API error (status 500): boom"));

        tracker.apply_progress(&progress("a.pdf", 100.0));
        assert_eq!(tracker.state_of(ids[0]), Some(FileState::Parsed));
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_progress_never_regresses() {
        let (mut tracker, _) = batch(&["a.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 80.0));
        tracker.apply_progress(&progress("a.pdf", 40.0));
        assert_eq!(tracker.overall_progress(), 80);
    }

    #[test]
    fn test_malformed_and_unknown_messages_ignored() {
        let (mut tracker, _) = batch(&["a.pdf"]);
        assert!(!tracker.apply_message("{not json"));
        assert!(!tracker.apply_message(r#"{"progress": 50}"#));
        assert!(!tracker.apply_message(r#"{"fileName": "other.pdf", "progress": 50}"#));
        assert_eq!(tracker.overall_progress(), 0);

        assert!(tracker.apply_message(r#"{"fileName": "a.pdf", "progress": 50}"#));
        assert_eq!(tracker.overall_progress(), 50);
    }

    #[test]
    fn test_duplicate_names_share_events() {
        let (mut tracker, _) = batch(&["cv.pdf", "cv.pdf"]);
        tracker.apply_progress(&progress("cv.pdf", 100.0));
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_fractional_progress_below_100_is_not_complete() {
        let (mut tracker, ids) = batch(&["a.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 99.5));
        assert!(!tracker.is_complete());
        assert_eq!(tracker.state_of(ids[0]), Some(FileState::Parsing));
        assert_eq!(tracker.overall_progress(), 100);
    }

    #[test]
    fn test_overall_rounds_only_the_mean() {
        let (mut tracker, _) = batch(&["a.pdf", "b.pdf", "c.pdf"]);
        tracker.apply_progress(&progress("a.pdf", 0.6));
        tracker.apply_progress(&progress("b.pdf", 0.6));
        // mean 0.4
        assert_eq!(tracker.overall_progress(), 0);
        assert_eq!(tracker.items()[0].progress, 0.6);
    }

    #[test]
    fn test_write_back_updates_queue_items() {
        let items: Vec<UploadItem> = ["a.pdf", "b.pdf"]
            .iter()
            .map(|n| UploadItem::new(CvDocument::new(*n, vec![0u8; 2]).unwrap()))
            .collect();
        let mut tracker = ProgressTracker::new(&items);
        let mut queued = items.clone();
        tracker.apply_dispatch(DispatchEvent::Started(items[0].id));
        tracker.apply_progress(&progress("b.pdf", 40.0));

        tracker.write_back(&mut queued);

        assert_eq!(queued[0].status, FileState::Uploading);
        assert_eq!(queued[0].progress, 0.0);
        assert_eq!(queued[1].status, FileState::Parsing);
        assert_eq!(queued[1].progress, 40.0);
    }

    #[test]
    fn test_empty_tracker_never_complete() {
        let (tracker, _) = batch(&[]);
        assert!(!tracker.is_complete());
        assert_eq!(tracker.overall_progress(), 0);
    }
}
