//! Encounter reference resolution.
//!
//! Every fact in a submission points at the encounter. When the encounter is created in
//! the same submission it has no server identifier yet, so a bundle-local `urn:uuid`
//! token stands in for it. When it already exists, facts point at it directly.

use consult_types::ConceptId;
use consult_uuid::UrnUuid;
use fhir::HttpVerb;

use crate::encounter::{CompleteEncounter, EncounterContext};

/// Whether the encounter entry creates or amends the encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmissionVerb {
    Create,
    Amend,
}

impl SubmissionVerb {
    pub fn http_verb(&self) -> HttpVerb {
        match self {
            SubmissionVerb::Create => HttpVerb::Post,
            SubmissionVerb::Amend => HttpVerb::Put,
        }
    }
}

/// The resolved verb and reference token for one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterReference {
    pub verb: SubmissionVerb,
    /// `urn:uuid:<uuid>` for a new encounter, `Encounter/<id>` for an existing one.
    pub token: String,
}

/// Resolves the encounter verb and token from the existing encounter identifier, if any.
///
/// A new token is generated on every call without an identifier; with an identifier the
/// token is derived from it and is the same on every call.
pub fn resolve_encounter_reference(existing: Option<&ConceptId>) -> EncounterReference {
    match existing {
        Some(id) => EncounterReference {
            verb: SubmissionVerb::Amend,
            token: id.reference("Encounter"),
        },
        None => EncounterReference {
            verb: SubmissionVerb::Create,
            token: UrnUuid::new().to_string(),
        },
    }
}

impl EncounterContext {
    pub fn resolve_reference(&self) -> EncounterReference {
        resolve_encounter_reference(self.encounter_id.as_ref())
    }
}

impl CompleteEncounter {
    pub fn resolve_reference(&self) -> EncounterReference {
        resolve_encounter_reference(self.encounter_id.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_encounter_gets_create_and_fresh_token() {
        let tokens: HashSet<String> = (0..100)
            .map(|_| {
                let resolved = resolve_encounter_reference(None);
                assert_eq!(resolved.verb, SubmissionVerb::Create);
                assert!(UrnUuid::is_canonical(&resolved.token), "{}", resolved.token);
                resolved.token
            })
            .collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn existing_encounter_gets_amend_and_stable_token() {
        let id = ConceptId::new("enc-42").expect("valid id");
        let first = resolve_encounter_reference(Some(&id));
        let second = resolve_encounter_reference(Some(&id));
        assert_eq!(first.verb, SubmissionVerb::Amend);
        assert_eq!(first.token, "Encounter/enc-42");
        assert_eq!(first, second);
        assert_eq!(first.verb.http_verb(), HttpVerb::Put);
    }
}
