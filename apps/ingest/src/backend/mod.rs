//! Backend client: the single point of entry for every REST call the ingestion client makes.
//!
//! Parsing, OCR, scoring and persistence all live on the backend. This module only
//! shapes requests and decodes responses; it never retries.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::IngestError;
use crate::models::{AcceptCandidate, CvDocument, Job, MatchResult, PreselectedCandidate};

pub const UPLOAD_PATH: &str = "/api/ocr/upload";
pub const JOB_REQUIREMENTS_PATH: &str = "/api/job-requirements";
pub const ACCEPT_CANDIDATE_PATH: &str = "/api/preselection/accept-candidate";

/// Every backend operation the workflow depends on.
/// `HttpBackend` is the production implementation; tests plug in fakes.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Uploads one document. The parsed record is opaque to the client.
    async fn upload_cv(&self, document: &CvDocument) -> Result<Value, IngestError>;

    /// Scores every known candidate against one job.
    async fn match_all(&self, job_id: i64) -> Result<Vec<MatchResult>, IngestError>;

    /// Scores one ad-hoc CV against a job definition.
    async fn match_one(&self, job: &Job, cv: &CvDocument) -> Result<MatchResult, IngestError>;

    async fn preselected_candidates(
        &self,
        job_id: i64,
    ) -> Result<Vec<PreselectedCandidate>, IngestError>;

    async fn accept_candidate(&self, form: &AcceptCandidate) -> Result<Value, IngestError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn upload_cv(&self, document: &CvDocument) -> Result<Value, IngestError> {
        let form = Form::new().part("files", document_part(document)?);
        debug!(
            "Uploading {} ({} bytes)",
            document.file_name,
            document.size_bytes()
        );

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        read_json_or_null(response).await
    }

    async fn match_all(&self, job_id: i64) -> Result<Vec<MatchResult>, IngestError> {
        debug!("Requesting match scores for job {job_id}");
        let response = self
            .client
            .get(self.url(&format!("{JOB_REQUIREMENTS_PATH}/job/{job_id}")))
            .send()
            .await?;
        read_json(response).await
    }

    async fn match_one(&self, job: &Job, cv: &CvDocument) -> Result<MatchResult, IngestError> {
        let form = Form::new()
            .part("file", document_part(cv)?)
            .text("job", serde_json::to_string(job)?);
        debug!("Matching {} against job '{}'", cv.file_name, job.title);

        let response = self
            .client
            .post(self.url(&format!("{JOB_REQUIREMENTS_PATH}/match")))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn preselected_candidates(
        &self,
        job_id: i64,
    ) -> Result<Vec<PreselectedCandidate>, IngestError> {
        let response = self
            .client
            .get(self.url(&format!("{JOB_REQUIREMENTS_PATH}/{job_id}/preselected")))
            .send()
            .await?;
        read_json(response).await
    }

    async fn accept_candidate(&self, form: &AcceptCandidate) -> Result<Value, IngestError> {
        let body = Form::new()
            .text("candidateId", form.candidate_id.to_string())
            .text("jobId", form.job_id.to_string())
            .text("interviewDate", form.interview_date.clone());

        let response = self
            .client
            .post(self.url(ACCEPT_CANDIDATE_PATH))
            .multipart(body)
            .send()
            .await?;
        read_json_or_null(response).await
    }
}

fn document_part(document: &CvDocument) -> Result<Part, IngestError> {
    Ok(Part::bytes(document.content.to_vec())
        .file_name(document.file_name.clone())
        .mime_str(document.mime)?)
}

/// Maps non-2xx to `IngestError::Api`, otherwise returns the raw body.
async fn checked_body(response: Response) -> Result<String, IngestError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(IngestError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, IngestError> {
    let body = checked_body(response).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Like `read_json`, but an empty 2xx body decodes to `Value::Null`.
async fn read_json_or_null(response: Response) -> Result<Value, IngestError> {
    let body = checked_body(response).await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}
