pub mod document;
pub mod job;
pub mod matching;
pub mod progress;
pub mod upload;

pub use document::CvDocument;
pub use job::{Certification, ContractType, FichePoste, Job, Skill, WorkTime};
pub use matching::{AcceptCandidate, MatchResult, MatchScore, PreselectedCandidate};
pub use progress::ProgressEvent;
pub use upload::{FileState, ItemId, UploadItem};
