// Bulk document ingestion: queue, sequential upload, progress tracking, batch control.
// All REST calls go through backend::BackendApi; progress arrives via push::PushChannel.

pub mod dispatcher;
pub mod queue;
pub mod session;
pub mod tracker;

pub use dispatcher::{DispatchEvent, UploadDispatcher, UploadOutcome};
pub use queue::UploadQueue;
pub use session::{BatchPhase, BatchProgress, BatchReport, IngestSession, SessionOptions};
pub use tracker::{ItemReport, ProgressTracker};
