use std::path::Path;

use bytes::Bytes;

use crate::errors::IngestError;

/// Uploadable CV formats. Mirrors the drop zone's accept filter.
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("pdf", "application/pdf"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// A CV file held in memory, ready to be sent as one multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct CvDocument {
    pub file_name: String,
    pub mime: &'static str,
    pub content: Bytes,
}

impl CvDocument {
    /// Builds a document from an in-memory body. The MIME type is derived from the extension.
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Result<Self, IngestError> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(IngestError::Validation("file name cannot be empty".to_string()));
        }
        let mime = mime_for(&file_name).ok_or_else(|| {
            IngestError::Validation(format!(
                "unsupported file type for '{file_name}' (supported: PNG, JPEG, PDF, DOCX)"
            ))
        })?;
        Ok(Self {
            file_name,
            mime,
            content: content.into(),
        })
    }

    pub async fn from_path(path: &Path) -> Result<Self, IngestError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                IngestError::Validation(format!("invalid file name: {}", path.display()))
            })?
            .to_string();
        // Reject before reading the body
        mime_for(&file_name).ok_or_else(|| {
            IngestError::Validation(format!(
                "unsupported file type for '{file_name}' (supported: PNG, JPEG, PDF, DOCX)"
            ))
        })?;
        let content = tokio::fs::read(path).await?;
        Self::new(file_name, content)
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

fn mime_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    ACCEPTED_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}
