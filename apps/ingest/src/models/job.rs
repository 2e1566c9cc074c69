//! Job-side entities. Owned by the backend; the client only carries them as match context.

use serde::{Deserialize, Serialize};

use crate::errors::IngestError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_issued: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    #[default]
    Cdi,
    Cdd,
    Stage,
    Interim,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkTime {
    #[default]
    TempsPlein,
    TempsPartiel,
}

/// Job requirement sheet ("fiche de poste") a posting may be derived from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FichePoste {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub workplace: String,
    #[serde(default)]
    pub worktime: WorkTime,
    #[serde(default)]
    pub mission: String,
    #[serde(default, rename = "positionH")]
    pub position_h: String,
    #[serde(default)]
    pub type_contrat: ContractType,
    #[serde(default)]
    pub required_skills: Vec<Skill>,
    #[serde(default)]
    pub required_certifications: Vec<Certification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_file: Option<String>,
    #[serde(default)]
    pub min_experience_years: u32,
    #[serde(default)]
    pub education_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub required_skills: Vec<Skill>,
    #[serde(default)]
    pub required_certifications: Vec<Certification>,
    #[serde(default)]
    pub education_level: String,
    #[serde(default)]
    pub min_experience_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiche_de_poste: Option<FichePoste>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_publication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_expiration: Option<String>,
}

impl Job {
    /// Checks the fields a match request cannot do without.
    pub fn validate_for_match(&self) -> Result<(), IngestError> {
        if self.title.trim().is_empty() {
            return Err(IngestError::Validation("job title is required".to_string()));
        }
        Ok(())
    }
}

/// Rejects ids the backend can never resolve.
pub fn validate_job_id(job_id: i64) -> Result<(), IngestError> {
    if job_id <= 0 {
        return Err(IngestError::Validation(format!(
            "job id must be positive, got {job_id}"
        )));
    }
    Ok(())
}
