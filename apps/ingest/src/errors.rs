use thiserror::Error;

/// Client-level error type.
/// Every backend call and every local validation step returns `Result<T, IngestError>`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Push channel error: {0}")]
    PushChannel(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl IngestError {
    /// Validation failures are raised before any request leaves the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::Validation(_))
    }

    /// Transport failures: network errors and non-2xx responses.
    pub fn is_transport(&self) -> bool {
        matches!(self, IngestError::Http(_) | IngestError::Api { .. })
    }
}
