use chrono::{DateTime, TimeDelta, Utc};
use fhir::condition::active_clinical_status;
use fhir::{BundleEntry, CodeableConcept, Condition, ConditionCategory, Resource};

use super::{create_entry, MappingContext};
use crate::stores::ConditionSelection;

/// Onset of a condition: the consultation date minus the reported duration.
///
/// Returns `None` when no duration was recorded or the subtraction leaves chrono's range.
pub fn onset_date(consultation_date: DateTime<Utc>, condition: &ConditionSelection) -> Option<DateTime<Utc>> {
    let days = condition.duration_days()?;
    TimeDelta::try_days(days).and_then(|delta| consultation_date.checked_sub_signed(delta))
}

/// Maps conditions to active problem-list conditions.
pub fn map_conditions(selections: &[ConditionSelection], ctx: &MappingContext) -> Vec<BundleEntry> {
    selections
        .iter()
        .map(|condition| {
            let onset = onset_date(ctx.consultation_date, condition);
            if onset.is_none() && condition.duration_days().is_some() {
                tracing::debug!(concept = %condition.concept, "condition onset out of range, omitting");
            }
            let resource = Condition {
                clinical_status: Some(active_clinical_status()),
                verification_status: None,
                category: vec![ConditionCategory::ProblemListItem.to_concept()],
                code: CodeableConcept::concept(condition.concept.as_str(), Some(condition.name.to_string())),
                subject: ctx.patient_ref(),
                encounter: ctx.encounter_ref(),
                onset_date_time: onset,
                recorded_date: ctx.consultation_date,
                recorder: ctx.recorder_ref(),
            };
            create_entry(Resource::Condition(resource))
        })
        .collect()
}
