//! FHIR R4 `Encounter` wire model.
//!
//! The encounter is the parent record of a consultation: every fact entry in the bundle
//! points back at it through its `encounter` element.

use crate::datatypes::{CodeableConcept, Coding, Period, Reference};
use serde::{Deserialize, Serialize};

/// HL7 v3 ActCode system used for `Encounter.class`.
pub const ENCOUNTER_CLASS_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";

/// Encounter lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterStatus {
    Planned,
    InProgress,
    Finished,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    /// Present only when an existing encounter is being amended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: EncounterStatus,

    pub class: Coding,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub encounter_type: Vec<CodeableConcept>,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<EncounterParticipant>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<EncounterLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    /// The visit this encounter belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Reference>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterParticipant {
    pub individual: Reference,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterLocation {
    pub location: Reference,
}

/// Ambulatory class coding used for outpatient consultations.
pub fn ambulatory_class() -> Coding {
    Coding {
        system: Some(ENCOUNTER_CLASS_SYSTEM.to_owned()),
        code: "AMB".to_owned(),
        display: Some("ambulatory".to_owned()),
    }
}
