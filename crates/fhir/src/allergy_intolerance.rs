//! FHIR R4 `AllergyIntolerance` wire model.

use crate::datatypes::{Annotation, CodeableConcept, Reference};
use crate::FhirError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ALLERGY_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-clinical";
pub const ALLERGY_VERIFICATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-verification";

/// Category of the identified substance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergyCategory {
    Food,
    Medication,
    Environment,
    Biologic,
}

/// Estimate of the severity of a reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionSeverity {
    Mild,
    Moderate,
    Severe,
}

impl ReactionSeverity {
    /// Parses a severity from its code, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, FhirError> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            _ => Err(FhirError::InvalidInput(format!(
                "Invalid reaction severity: {}",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub clinical_status: CodeableConcept,

    pub verification_status: CodeableConcept,

    /// Always `allergy` for consultation entries.
    #[serde(rename = "type")]
    pub allergy_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<AllergyCategory>,

    pub code: CodeableConcept,

    pub patient: Reference,

    pub encounter: Reference,

    pub recorded_date: DateTime<Utc>,

    pub recorder: Reference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reaction: Vec<AllergyReaction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyReaction {
    pub manifestation: Vec<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<ReactionSeverity>,
}

pub fn active_allergy_status() -> CodeableConcept {
    CodeableConcept::from_system(ALLERGY_CLINICAL_SYSTEM, "active", Some("Active"))
}

pub fn confirmed_allergy_verification() -> CodeableConcept {
    CodeableConcept::from_system(ALLERGY_VERIFICATION_SYSTEM, "confirmed", Some("Confirmed"))
}
