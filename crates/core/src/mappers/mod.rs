//! Fact entry mappers.
//!
//! One pure function per clinical category turns that category's selections into
//! transaction entries. Mappers do not depend on each other or on call order; every
//! entry they produce is a create with its own fresh `urn:uuid` token and links to the
//! encounter through [`MappingContext::encounter`].

use chrono::{DateTime, Utc};
use consult_uuid::UrnUuid;
use fhir::{BundleEntry, Reference, Resource};

use crate::encounter::CompleteEncounter;
use crate::reference::EncounterReference;

mod allergy;
mod condition;
mod diagnosis;
mod investigation;
mod medication;

pub use allergy::map_allergies;
pub use condition::{map_conditions, onset_date};
pub use diagnosis::map_diagnoses;
pub use investigation::map_investigations;
pub use medication::map_medications;

/// References and timestamp shared by every mapper in one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingContext {
    /// `Patient/<id>`.
    pub patient: String,
    /// The encounter token resolved for this submission.
    pub encounter: String,
    /// `Practitioner/<id>` of the recorder.
    pub recorder: String,
    pub consultation_date: DateTime<Utc>,
}

impl MappingContext {
    pub fn new(encounter: &CompleteEncounter, reference: &EncounterReference) -> Self {
        Self {
            patient: encounter.patient_reference(),
            encounter: reference.token.clone(),
            recorder: encounter.practitioner_reference(),
            consultation_date: encounter.consultation_date,
        }
    }

    pub(crate) fn patient_ref(&self) -> Reference {
        Reference::to(self.patient.clone())
    }

    pub(crate) fn encounter_ref(&self) -> Reference {
        Reference::to(self.encounter.clone())
    }

    pub(crate) fn recorder_ref(&self) -> Reference {
        Reference::to(self.recorder.clone())
    }
}

pub(crate) fn create_entry(resource: Resource) -> BundleEntry {
    BundleEntry::create(UrnUuid::new().to_string(), resource)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::MappingContext;
    use consult_types::ConceptId;

    pub(crate) const TOKEN: &str = "urn:uuid:6f1c2a0e-1f2b-4c3d-8e4f-5a6b7c8d9e0f";

    pub(crate) fn id(s: &str) -> ConceptId {
        ConceptId::new(s).expect("valid id")
    }

    pub(crate) fn context() -> MappingContext {
        MappingContext {
            patient: "Patient/patient-1".into(),
            encounter: TOKEN.into(),
            recorder: "Practitioner/dr-1".into(),
            consultation_date: "2025-03-01T09:30:00Z".parse().expect("timestamp"),
        }
    }
}
