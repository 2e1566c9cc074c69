use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::IngestError;

/// `{fileName, progress}` message from the push channel. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub file_name: String,
    pub progress: f64,
}

impl ProgressEvent {
    /// Parses a raw message body. Rejects payloads without a file name or a numeric progress.
    pub fn parse(body: &str) -> Result<Self, IngestError> {
        let value: Value = serde_json::from_str(body)?;

        let file_name = value
            .get("fileName")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IngestError::Validation("progress message has no fileName".to_string()))?;
        let progress = value
            .get("progress")
            .and_then(|v| v.as_f64())
            .filter(|p| p.is_finite())
            .ok_or_else(|| {
                IngestError::Validation("progress message has no numeric progress".to_string())
            })?;

        Ok(Self {
            file_name: file_name.to_string(),
            progress,
        })
    }

    /// Progress clamped to 0..=100. Not rounded: 99.5 is still short of done.
    pub fn percent(&self) -> f64 {
        self.progress.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_message() {
        let event = ProgressEvent::parse(r#"{"fileName":"a.pdf","progress":50}"#).unwrap();
        assert_eq!(event.file_name, "a.pdf");
        assert_eq!(event.percent(), 50.0);
    }

    #[test]
    fn test_string_progress_rejected() {
        let err = ProgressEvent::parse(r#"{"fileName":"a.pdf","progress":"50"}"#).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_file_name_rejected() {
        assert!(ProgressEvent::parse(r#"{"progress":10}"#).is_err());
        assert!(ProgressEvent::parse(r#"{"fileName":"","progress":10}"#).is_err());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = ProgressEvent::parse("not json").unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }

    #[test]
    fn test_percent_clamps_out_of_range() {
        let over = ProgressEvent {
            file_name: "x.png".to_string(),
            progress: 130.0,
        };
        let under = ProgressEvent {
            file_name: "x.png".to_string(),
            progress: -4.0,
        };
        assert_eq!(over.percent(), 100.0);
        assert_eq!(under.percent(), 0.0);
    }

    #[test]
    fn test_percent_keeps_fraction() {
        let event = ProgressEvent::parse(r#"{"fileName":"a.pdf","progress":99.5}"#).unwrap();
        assert_eq!(event.percent(), 99.5);
    }
}
