//! In-memory backend used by unit tests across modules.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::backend::BackendApi;
use crate::errors::IngestError;
use crate::models::{
    AcceptCandidate, CvDocument, Job, MatchResult, MatchScore, PreselectedCandidate,
};
use crate::push::BroadcastChannel;

/// Scriptable fake. When a worker channel is attached, each upload publishes the
/// file's scripted progress events (default `[50, 100]`) before it resolves.
#[derive(Default)]
pub struct FakeBackend {
    failing_uploads: HashSet<String>,
    failing_matches: HashSet<String>,
    hanging_uploads: bool,
    scores: HashMap<String, String>,
    match_delays: HashMap<String, Duration>,
    match_all_results: Vec<MatchResult>,
    worker: Option<(BroadcastChannel, String)>,
    progress_scripts: HashMap<String, Vec<f64>>,
    log: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upload(mut self, file_name: &str) -> Self {
        self.failing_uploads.insert(file_name.to_string());
        self
    }

    pub fn failing_match(mut self, file_name: &str) -> Self {
        self.failing_matches.insert(file_name.to_string());
        self
    }

    /// Uploads never resolve.
    pub fn hanging_uploads(mut self) -> Self {
        self.hanging_uploads = true;
        self
    }

    pub fn score(mut self, file_name: &str, score: &str) -> Self {
        self.scores.insert(file_name.to_string(), score.to_string());
        self
    }

    pub fn match_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.match_delays.insert(file_name.to_string(), delay);
        self
    }

    pub fn match_all_results(mut self, results: Vec<MatchResult>) -> Self {
        self.match_all_results = results;
        self
    }

    pub fn with_worker(mut self, channel: BroadcastChannel, topic: &str) -> Self {
        self.worker = Some((channel, topic.to_string()));
        self
    }

    pub fn progress_script(mut self, file_name: &str, events: Vec<f64>) -> Self {
        self.progress_scripts.insert(file_name.to_string(), events);
        self
    }

    pub fn call_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.call_log()
            .iter()
            .filter_map(|line| line.strip_prefix("start ").map(String::from))
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

pub fn match_result(cv_id: Option<i64>, name: &str, score: &str) -> MatchResult {
    MatchResult {
        cv_id,
        name: Some(name.to_string()),
        match_score: MatchScore::Text(score.to_string()),
        extra: Default::default(),
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn upload_cv(&self, document: &CvDocument) -> Result<Value, IngestError> {
        let name = document.file_name.clone();
        self.record(format!("start {name}"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Give an overlapping caller the chance to start a second upload
        tokio::task::yield_now().await;
        if self.hanging_uploads {
            futures::future::pending::<()>().await;
        }

        if let Some((channel, topic)) = &self.worker {
            let script = self
                .progress_scripts
                .get(&name)
                .cloned()
                .unwrap_or_else(|| vec![50.0, 100.0]);
            for progress in script {
                channel.publish(topic, json!({ "fileName": name, "progress": progress }).to_string());
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(format!("end {name}"));

        if self.failing_uploads.contains(&name) {
            return Err(IngestError::Api {
                status: 500,
                message: format!("OCR worker rejected {name}"),
            });
        }
        Ok(json!({ "fileName": name, "status": "parsed" }))
    }

    async fn match_all(&self, job_id: i64) -> Result<Vec<MatchResult>, IngestError> {
        self.record(format!("match_all {job_id}"));
        Ok(self.match_all_results.clone())
    }

    async fn match_one(&self, job: &Job, cv: &CvDocument) -> Result<MatchResult, IngestError> {
        let name = cv.file_name.clone();
        self.record(format!("match {name} {}", job.title));
        if let Some(delay) = self.match_delays.get(&name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_matches.contains(&name) {
            return Err(IngestError::Api {
                status: 422,
                message: format!("could not read {name}"),
            });
        }
        let score = self.scores.get(&name).cloned().unwrap_or_else(|| "50".to_string());
        Ok(match_result(None, &name, &score))
    }

    async fn preselected_candidates(
        &self,
        job_id: i64,
    ) -> Result<Vec<PreselectedCandidate>, IngestError> {
        self.record(format!("preselected {job_id}"));
        Ok(vec![])
    }

    async fn accept_candidate(&self, form: &AcceptCandidate) -> Result<Value, IngestError> {
        self.record(format!(
            "accept {} {} {}",
            form.candidate_id, form.job_id, form.interview_date
        ));
        Ok(json!({ "status": "accepted" }))
    }
}
