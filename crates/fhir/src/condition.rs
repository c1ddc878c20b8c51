//! FHIR R4 `Condition` wire model.
//!
//! Two kinds of consultation facts map onto `Condition`:
//! - encounter diagnoses (category `encounter-diagnosis`, carrying a verification status)
//! - problem-list conditions (category `problem-list-item`, carrying an onset date)

use crate::datatypes::{CodeableConcept, Reference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CONDITION_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VERIFICATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const CONDITION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-category";

/// `Condition.category` codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionCategory {
    EncounterDiagnosis,
    ProblemListItem,
}

impl ConditionCategory {
    pub fn code(&self) -> &'static str {
        match self {
            ConditionCategory::EncounterDiagnosis => "encounter-diagnosis",
            ConditionCategory::ProblemListItem => "problem-list-item",
        }
    }

    pub fn to_concept(self) -> CodeableConcept {
        CodeableConcept::from_system(CONDITION_CATEGORY_SYSTEM, self.code(), None)
    }
}

/// `Condition.verificationStatus` codes emitted by the consultation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Provisional,
    Confirmed,
}

impl VerificationStatus {
    pub fn code(&self) -> &'static str {
        match self {
            VerificationStatus::Provisional => "provisional",
            VerificationStatus::Confirmed => "confirmed",
        }
    }

    pub fn to_concept(self) -> CodeableConcept {
        CodeableConcept::from_system(CONDITION_VERIFICATION_SYSTEM, self.code(), None)
    }
}

/// `clinicalStatus = active`.
pub fn active_clinical_status() -> CodeableConcept {
    CodeableConcept::from_system(CONDITION_CLINICAL_SYSTEM, "active", Some("Active"))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    pub encounter: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<DateTime<Utc>>,

    pub recorded_date: DateTime<Utc>,

    pub recorder: Reference,
}
