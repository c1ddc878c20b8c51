use consult_types::{ConceptId, NonEmptyText};
use fhir::{AllergyCategory, ReactionSeverity};
use std::collections::BTreeSet;

use super::{ensure_absent, position_of, CategoryStore, FactCategory, FieldError, SelectionErrors, Validate};
use crate::ConsultResult;

#[derive(Clone, Debug, PartialEq)]
pub struct AllergySelection {
    pub concept: ConceptId,
    pub name: NonEmptyText,
    pub category: AllergyCategory,
    /// Unset until the clinician picks one.
    pub severity: Option<ReactionSeverity>,
    /// Reaction concepts, kept sorted so the emitted manifestations are stable.
    pub reactions: BTreeSet<ConceptId>,
    pub note: Option<String>,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllergyStore {
    selections: Vec<AllergySelection>,
}

impl AllergyStore {
    pub fn add(
        &mut self,
        concept: ConceptId,
        name: impl AsRef<str>,
        category: AllergyCategory,
    ) -> ConsultResult<()> {
        ensure_absent(&self.selections, |s| s.concept == concept, Self::CATEGORY, &concept)?;
        let name = NonEmptyText::new(name)?;
        self.selections.push(AllergySelection {
            concept,
            name,
            category,
            severity: None,
            reactions: BTreeSet::new(),
            note: None,
            errors: Vec::new(),
        });
        Ok(())
    }

    pub fn remove(&mut self, concept: &ConceptId) -> ConsultResult<AllergySelection> {
        let idx = self.index_of(concept)?;
        Ok(self.selections.remove(idx))
    }

    pub fn set_severity(&mut self, concept: &ConceptId, severity: ReactionSeverity) -> ConsultResult<()> {
        let idx = self.index_of(concept)?;
        let selection = &mut self.selections[idx];
        selection.severity = Some(severity);
        selection.errors.retain(|e| *e != FieldError::Required("severity"));
        Ok(())
    }

    /// Adds a reaction; returns `false` if it was already recorded.
    pub fn add_reaction(&mut self, concept: &ConceptId, reaction: ConceptId) -> ConsultResult<bool> {
        let idx = self.index_of(concept)?;
        let selection = &mut self.selections[idx];
        let inserted = selection.reactions.insert(reaction);
        selection.errors.retain(|e| *e != FieldError::Required("reactions"));
        Ok(inserted)
    }

    pub fn remove_reaction(&mut self, concept: &ConceptId, reaction: &ConceptId) -> ConsultResult<bool> {
        let idx = self.index_of(concept)?;
        Ok(self.selections[idx].reactions.remove(reaction))
    }

    pub fn set_note(&mut self, concept: &ConceptId, note: Option<String>) -> ConsultResult<()> {
        let idx = self.index_of(concept)?;
        self.selections[idx].note = note
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        Ok(())
    }

    pub fn get(&self, concept: &ConceptId) -> Option<&AllergySelection> {
        self.selections.iter().find(|s| &s.concept == concept)
    }

    fn index_of(&self, concept: &ConceptId) -> ConsultResult<usize> {
        position_of(&self.selections, |s| &s.concept == concept, Self::CATEGORY, concept)
    }
}

impl CategoryStore for AllergyStore {
    type Selection = AllergySelection;

    const CATEGORY: FactCategory = FactCategory::Allergy;

    fn selections(&self) -> &[AllergySelection] {
        &self.selections
    }

    fn reset(&mut self) {
        self.selections.clear();
    }
}

impl Validate for AllergyStore {
    fn validate(&mut self) -> bool {
        let mut valid = true;
        for selection in &mut self.selections {
            selection.errors.clear();
            if selection.severity.is_none() {
                selection.errors.push(FieldError::Required("severity"));
            }
            if selection.reactions.is_empty() {
                selection.errors.push(FieldError::Required("reactions"));
            }
            valid &= selection.errors.is_empty();
        }
        valid
    }

    fn field_errors(&self) -> Vec<SelectionErrors> {
        self.selections
            .iter()
            .filter(|s| !s.errors.is_empty())
            .map(|s| SelectionErrors {
                category: Self::CATEGORY,
                concept: s.concept.clone(),
                name: s.name.to_string(),
                errors: s.errors.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConsultError;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s).expect("valid id")
    }

    #[test]
    fn severity_and_a_reaction_are_required() {
        let mut store = AllergyStore::default();
        store
            .add(id("alg-1"), "Penicillin", AllergyCategory::Medication)
            .expect("add");

        assert!(!store.validate());
        assert_eq!(
            store.get(&id("alg-1")).expect("present").errors,
            vec![FieldError::Required("severity"), FieldError::Required("reactions")]
        );

        store.set_severity(&id("alg-1"), ReactionSeverity::Severe).expect("severity");
        assert!(!store.validate());

        assert!(store.add_reaction(&id("alg-1"), id("rash")).expect("reaction"));
        assert!(store.validate());
    }

    #[test]
    fn reactions_are_a_set() {
        let mut store = AllergyStore::default();
        store.add(id("alg-1"), "Peanut", AllergyCategory::Food).expect("add");
        assert!(store.add_reaction(&id("alg-1"), id("hives")).expect("first"));
        assert!(!store.add_reaction(&id("alg-1"), id("hives")).expect("second"));
        assert_eq!(store.get(&id("alg-1")).expect("present").reactions.len(), 1);
        assert!(store.remove_reaction(&id("alg-1"), &id("hives")).expect("remove"));
    }

    #[test]
    fn duplicate_allergen_is_rejected() {
        let mut store = AllergyStore::default();
        store.add(id("alg-1"), "Peanut", AllergyCategory::Food).expect("add");
        assert!(matches!(
            store.add(id("alg-1"), "Peanut", AllergyCategory::Food),
            Err(ConsultError::DuplicateSelection { category: FactCategory::Allergy, .. })
        ));
    }

    #[test]
    fn blank_note_is_dropped() {
        let mut store = AllergyStore::default();
        store.add(id("alg-1"), "Dust", AllergyCategory::Environment).expect("add");
        store.set_note(&id("alg-1"), Some("   ".into())).expect("note");
        assert_eq!(store.get(&id("alg-1")).expect("present").note, None);
    }
}
