use fhir::condition::active_clinical_status;
use fhir::{BundleEntry, CodeableConcept, Condition, ConditionCategory, Resource};

use super::{create_entry, MappingContext};
use crate::stores::DiagnosisSelection;

/// Maps diagnoses to encounter-diagnosis conditions. Certainty becomes the verification
/// status verbatim.
pub fn map_diagnoses(selections: &[DiagnosisSelection], ctx: &MappingContext) -> Vec<BundleEntry> {
    selections
        .iter()
        .filter_map(|dx| {
            let Some(certainty) = dx.certainty else {
                tracing::debug!(concept = %dx.concept, "skipping diagnosis without certainty");
                return None;
            };
            let condition = Condition {
                clinical_status: Some(active_clinical_status()),
                verification_status: Some(certainty.verification_status().to_concept()),
                category: vec![ConditionCategory::EncounterDiagnosis.to_concept()],
                code: CodeableConcept::concept(dx.concept.as_str(), Some(dx.name.to_string())),
                subject: ctx.patient_ref(),
                encounter: ctx.encounter_ref(),
                onset_date_time: None,
                recorded_date: ctx.consultation_date,
                recorder: ctx.recorder_ref(),
            };
            Some(create_entry(Resource::Condition(condition)))
        })
        .collect()
}
