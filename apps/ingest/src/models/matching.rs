use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::IngestError;

/// Backend-computed suitability score. Sent as a numeric string, tolerated as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchScore {
    Text(String),
    Number(f64),
}

impl Default for MatchScore {
    fn default() -> Self {
        MatchScore::Text(String::new())
    }
}

impl MatchScore {
    /// Numeric value, or `None` when the backend sent something unparseable.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            MatchScore::Text(s) => s.trim().parse::<f64>().ok()?,
            MatchScore::Number(n) => *n,
        };
        value.is_finite().then_some(value)
    }
}

/// One candidate-to-job score. Unknown backend fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "cvId", default, skip_serializing_if = "Option::is_none")]
    pub cv_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub match_score: MatchScore,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatchResult {
    pub fn score(&self) -> Option<f64> {
        self.match_score.value()
    }

    /// "Show profile" needs a CV id.
    pub fn can_show(&self) -> bool {
        self.cv_id.is_some()
    }

    /// "Accept" needs both the CV id and the job the match was computed for.
    pub fn can_accept(&self, job_id: Option<i64>) -> bool {
        self.cv_id.is_some() && job_id.is_some()
    }
}

/// A candidate already accepted for an interview on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreselectedCandidate {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept-candidate form. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptCandidate {
    pub candidate_id: i64,
    pub job_id: i64,
    pub interview_date: String,
}

impl AcceptCandidate {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.candidate_id <= 0 {
            return Err(IngestError::Validation("candidate id is required".to_string()));
        }
        if self.job_id <= 0 {
            return Err(IngestError::Validation("job id is required".to_string()));
        }
        let date = self.interview_date.trim();
        if date.is_empty() {
            return Err(IngestError::Validation("interview date is required".to_string()));
        }
        let parses = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M").is_ok()
            || NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S").is_ok()
            || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
        if !parses {
            return Err(IngestError::Validation(format!(
                "interview date '{date}' must be YYYY-MM-DD or YYYY-MM-DDTHH:MM"
            )));
        }
        Ok(())
    }
}
