use fhir::allergy_intolerance::{active_allergy_status, confirmed_allergy_verification};
use fhir::{AllergyIntolerance, AllergyReaction, Annotation, BundleEntry, CodeableConcept, Resource};

use super::{create_entry, MappingContext};
use crate::stores::AllergySelection;

/// Maps allergies to active, confirmed allergy intolerances.
///
/// Severity and reactions are emitted only when present.
pub fn map_allergies(selections: &[AllergySelection], ctx: &MappingContext) -> Vec<BundleEntry> {
    selections
        .iter()
        .map(|allergy| {
            let reaction = if allergy.severity.is_none() && allergy.reactions.is_empty() {
                Vec::new()
            } else {
                vec![AllergyReaction {
                    manifestation: allergy
                        .reactions
                        .iter()
                        .map(|r| CodeableConcept::concept(r.as_str(), None))
                        .collect(),
                    severity: allergy.severity,
                }]
            };

            let resource = AllergyIntolerance {
                clinical_status: active_allergy_status(),
                verification_status: confirmed_allergy_verification(),
                allergy_type: "allergy".to_owned(),
                category: vec![allergy.category],
                code: CodeableConcept::concept(allergy.concept.as_str(), Some(allergy.name.to_string())),
                patient: ctx.patient_ref(),
                encounter: ctx.encounter_ref(),
                recorded_date: ctx.consultation_date,
                recorder: ctx.recorder_ref(),
                reaction,
                note: allergy
                    .note
                    .iter()
                    .map(|text| Annotation { text: text.clone() })
                    .collect(),
            };
            create_entry(Resource::AllergyIntolerance(resource))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{context, id, TOKEN};
    use crate::stores::{AllergyStore, CategoryStore};
    use fhir::{AllergyCategory, ReactionSeverity};

    #[test]
    fn maps_severity_reactions_and_note() {
        let mut store = AllergyStore::default();
        store.add(id("alg-1"), "Penicillin", AllergyCategory::Medication).expect("add");
        store.set_severity(&id("alg-1"), ReactionSeverity::Severe).expect("severity");
        store.add_reaction(&id("alg-1"), id("rash")).expect("reaction");
        store.add_reaction(&id("alg-1"), id("anaphylaxis")).expect("reaction");
        store.set_note(&id("alg-1"), Some("Since childhood".into())).expect("note");

        let entries = map_allergies(store.selections(), &context());
        assert_eq!(entries.len(), 1);
        let Resource::AllergyIntolerance(allergy) = &entries[0].resource else {
            panic!("expected AllergyIntolerance");
        };
        assert_eq!(allergy.encounter.as_str(), Some(TOKEN));
        assert_eq!(allergy.patient.as_str(), Some("Patient/patient-1"));
        assert_eq!(allergy.category, vec![AllergyCategory::Medication]);
        assert_eq!(allergy.reaction[0].severity, Some(ReactionSeverity::Severe));
        let codes: Vec<_> = allergy.reaction[0]
            .manifestation
            .iter()
            .filter_map(|m| m.first_code())
            .collect();
        assert_eq!(codes, vec!["anaphylaxis", "rash"]);
        assert_eq!(allergy.note[0].text, "Since childhood");
    }

    #[test]
    fn absent_severity_and_reactions_are_omitted() {
        let mut store = AllergyStore::default();
        store.add(id("alg-1"), "Dust", AllergyCategory::Environment).expect("add");
        let entries = map_allergies(store.selections(), &context());
        let Resource::AllergyIntolerance(allergy) = &entries[0].resource else {
            panic!("expected AllergyIntolerance");
        };
        assert!(allergy.reaction.is_empty());
        assert!(allergy.note.is_empty());
    }
}
