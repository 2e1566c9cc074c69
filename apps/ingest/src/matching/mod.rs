//! Match Requester: candidate-to-job scores computed by the backend, ranked for display.
//!
//! `match_all` scores every known candidate against one job. `match_many` fans one
//! ad-hoc CV per request out concurrently and keeps every outcome, in submission order.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::BackendApi;
use crate::errors::IngestError;
use crate::models::job::validate_job_id;
use crate::models::{AcceptCandidate, CvDocument, Job, MatchResult, PreselectedCandidate};

pub mod ranking;

pub use ranking::rank_by_score;

/// Outcome of scoring one ad-hoc CV.
#[derive(Debug)]
pub struct MatchOutcome {
    pub file_name: String,
    pub result: Result<MatchResult, IngestError>,
}

/// Every outcome of a fan-out, in the order the CVs were submitted.
#[derive(Debug, Default)]
pub struct MatchBatch {
    pub outcomes: Vec<MatchOutcome>,
}

impl MatchBatch {
    /// Successful results merged and ranked. Ties keep submission order.
    pub fn ranked(&self) -> Vec<MatchResult> {
        let mut merged: Vec<MatchResult> = self
            .outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect();
        rank_by_score(&mut merged);
        merged
    }

    pub fn failures(&self) -> impl Iterator<Item = &MatchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

#[derive(Clone)]
pub struct MatchRequester {
    backend: Arc<dyn BackendApi>,
}

impl MatchRequester {
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self { backend }
    }

    /// Fresh, ranked scores of all candidates for `job_id`.
    pub async fn match_all(&self, job_id: i64) -> Result<Vec<MatchResult>, IngestError> {
        validate_job_id(job_id)?;
        let mut results = self.backend.match_all(job_id).await?;
        rank_by_score(&mut results);
        info!("Job {job_id}: {} match result(s)", results.len());
        Ok(results)
    }

    pub async fn match_one(&self, job: &Job, cv: &CvDocument) -> Result<MatchResult, IngestError> {
        job.validate_for_match()?;
        if cv.is_empty() {
            return Err(IngestError::Validation(format!(
                "{} is empty",
                cv.file_name
            )));
        }
        self.backend.match_one(job, cv).await
    }

    /// Issues one `match_one` per CV concurrently. A failed CV never aborts its siblings.
    pub async fn match_many(&self, job: &Job, cvs: Vec<CvDocument>) -> Result<MatchBatch, IngestError> {
        job.validate_for_match()?;

        let requests = cvs.into_iter().map(|cv| async move {
            let result = self.match_one(job, &cv).await;
            if let Err(e) = &result {
                warn!("Matching {} against '{}' failed: {e}", cv.file_name, job.title);
            }
            MatchOutcome {
                file_name: cv.file_name,
                result,
            }
        });
        let batch = MatchBatch {
            outcomes: join_all(requests).await,
        };

        info!(
            "Matched {}/{} CV(s) against '{}'",
            batch.success_count(),
            batch.outcomes.len(),
            job.title
        );
        Ok(batch)
    }

    pub async fn preselected_candidates(
        &self,
        job_id: i64,
    ) -> Result<Vec<PreselectedCandidate>, IngestError> {
        validate_job_id(job_id)?;
        self.backend.preselected_candidates(job_id).await
    }

    /// Accepts a ranked candidate for an interview.
    pub async fn accept(
        &self,
        result: &MatchResult,
        job_id: Option<i64>,
        interview_date: &str,
    ) -> Result<Value, IngestError> {
        let (Some(candidate_id), Some(job_id)) = (result.cv_id, job_id) else {
            return Err(IngestError::Validation(
                "accepting a candidate needs both a CV id and a job id".to_string(),
            ));
        };
        self.accept_candidate(&AcceptCandidate {
            candidate_id,
            job_id,
            interview_date: interview_date.to_string(),
        })
        .await
    }

    pub async fn accept_candidate(&self, form: &AcceptCandidate) -> Result<Value, IngestError> {
        form.validate()?;
        let response = self.backend.accept_candidate(form).await?;
        info!(
            "Candidate {} accepted for job {} on {}",
            form.candidate_id, form.job_id, form.interview_date
        );
        Ok(response)
    }
}
