use consult_types::{ConceptId, NonEmptyText};
use fhir::VerificationStatus;
use serde::{Deserialize, Serialize};

use super::{ensure_absent, position_of, CategoryStore, FactCategory, FieldError, SelectionErrors, Validate};
use crate::ConsultResult;

/// How sure the clinician is of a diagnosis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Certainty {
    Provisional,
    Confirmed,
}

impl Certainty {
    pub fn verification_status(self) -> VerificationStatus {
        match self {
            Certainty::Provisional => VerificationStatus::Provisional,
            Certainty::Confirmed => VerificationStatus::Confirmed,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosisSelection {
    pub concept: ConceptId,
    pub name: NonEmptyText,
    /// Unset until the clinician picks one.
    pub certainty: Option<Certainty>,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagnosisStore {
    selections: Vec<DiagnosisSelection>,
}

impl DiagnosisStore {
    pub fn add(&mut self, concept: ConceptId, name: impl AsRef<str>) -> ConsultResult<()> {
        ensure_absent(&self.selections, |s| s.concept == concept, Self::CATEGORY, &concept)?;
        let name = NonEmptyText::new(name)?;
        self.selections.push(DiagnosisSelection {
            concept,
            name,
            certainty: None,
            errors: Vec::new(),
        });
        Ok(())
    }

    pub fn remove(&mut self, concept: &ConceptId) -> ConsultResult<DiagnosisSelection> {
        let idx = position_of(&self.selections, |s| &s.concept == concept, Self::CATEGORY, concept)?;
        Ok(self.selections.remove(idx))
    }

    pub fn set_certainty(&mut self, concept: &ConceptId, certainty: Certainty) -> ConsultResult<()> {
        let idx = position_of(&self.selections, |s| &s.concept == concept, Self::CATEGORY, concept)?;
        let selection = &mut self.selections[idx];
        selection.certainty = Some(certainty);
        selection.errors.retain(|e| *e != FieldError::Required("certainty"));
        Ok(())
    }

    pub fn get(&self, concept: &ConceptId) -> Option<&DiagnosisSelection> {
        self.selections.iter().find(|s| &s.concept == concept)
    }
}

impl CategoryStore for DiagnosisStore {
    type Selection = DiagnosisSelection;

    const CATEGORY: FactCategory = FactCategory::Diagnosis;

    fn selections(&self) -> &[DiagnosisSelection] {
        &self.selections
    }

    fn reset(&mut self) {
        self.selections.clear();
    }
}

impl Validate for DiagnosisStore {
    fn validate(&mut self) -> bool {
        let mut valid = true;
        for selection in &mut self.selections {
            selection.errors.clear();
            if selection.certainty.is_none() {
                selection.errors.push(FieldError::Required("certainty"));
                valid = false;
            }
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
    fn duplicate_diagnosis_is_rejected() {
        let mut store = DiagnosisStore::default();
        store.add(id("dx-1"), "Malaria").expect("first add");
        let err = store.add(id("dx-1"), "Malaria").expect_err("duplicate");
        assert!(matches!(
            err,
            ConsultError::DuplicateSelection { category: FactCategory::Diagnosis, .. }
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut store = DiagnosisStore::default();
        assert!(matches!(store.add(id("dx-1"), "  "), Err(ConsultError::Text(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn certainty_is_required() {
        let mut store = DiagnosisStore::default();
        store.add(id("dx-1"), "Malaria").expect("add");
        assert!(!store.validate());
        assert_eq!(
            store.get(&id("dx-1")).expect("present").errors,
            vec![FieldError::Required("certainty")]
        );

        store.set_certainty(&id("dx-1"), Certainty::Provisional).expect("set");
        assert!(store.get(&id("dx-1")).expect("present").errors.is_empty());
        assert!(store.validate());
        assert!(store.field_errors().is_empty());
    }

    #[test]
    fn remove_unknown_diagnosis_fails() {
        let mut store = DiagnosisStore::default();
        assert!(matches!(
            store.remove(&id("dx-9")),
            Err(ConsultError::UnknownSelection { .. })
        ));
    }
}
