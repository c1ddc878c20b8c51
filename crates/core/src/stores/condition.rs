use consult_types::{ConceptId, NonEmptyText};
use serde::{Deserialize, Serialize};

use super::{ensure_absent, position_of, CategoryStore, FactCategory, FieldError, SelectionErrors, Validate};
use crate::ConsultResult;

/// Unit of the "how long has the patient had this" duration of a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnsetUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl OnsetUnit {
    pub fn days_multiplier(self) -> i64 {
        match self {
            OnsetUnit::Days => 1,
            OnsetUnit::Weeks => 7,
            OnsetUnit::Months => 30,
            OnsetUnit::Years => 365,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConditionSelection {
    pub concept: ConceptId,
    pub name: NonEmptyText,
    pub duration_value: Option<u32>,
    pub duration_unit: Option<OnsetUnit>,
    pub errors: Vec<FieldError>,
}

impl ConditionSelection {
    /// Duration in days, when both value and unit are set.
    pub fn duration_days(&self) -> Option<i64> {
        match (self.duration_value, self.duration_unit) {
            (Some(value), Some(unit)) => Some(i64::from(value) * unit.days_multiplier()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConditionStore {
    selections: Vec<ConditionSelection>,
}

impl ConditionStore {
    pub fn add(&mut self, concept: ConceptId, name: impl AsRef<str>) -> ConsultResult<()> {
        ensure_absent(&self.selections, |s| s.concept == concept, Self::CATEGORY, &concept)?;
        let name = NonEmptyText::new(name)?;
        self.selections.push(ConditionSelection {
            concept,
            name,
            duration_value: None,
            duration_unit: None,
            errors: Vec::new(),
        });
        Ok(())
    }

    pub fn remove(&mut self, concept: &ConceptId) -> ConsultResult<ConditionSelection> {
        let idx = self.index_of(concept)?;
        Ok(self.selections.remove(idx))
    }

    pub fn set_duration(
        &mut self,
        concept: &ConceptId,
        value: Option<u32>,
        unit: Option<OnsetUnit>,
    ) -> ConsultResult<()> {
        let idx = self.index_of(concept)?;
        let selection = &mut self.selections[idx];
        selection.duration_value = value;
        selection.duration_unit = unit;
        selection.errors.clear();
        Ok(())
    }

    pub fn get(&self, concept: &ConceptId) -> Option<&ConditionSelection> {
        self.selections.iter().find(|s| &s.concept == concept)
    }

    fn index_of(&self, concept: &ConceptId) -> ConsultResult<usize> {
        position_of(&self.selections, |s| &s.concept == concept, Self::CATEGORY, concept)
    }
}

impl CategoryStore for ConditionStore {
    type Selection = ConditionSelection;

    const CATEGORY: FactCategory = FactCategory::Condition;

    fn selections(&self) -> &[ConditionSelection] {
        &self.selections
    }

    fn reset(&mut self) {
        self.selections.clear();
    }
}

impl Validate for ConditionStore {
    /// A duration is optional, but a value without a unit (or the reverse) is rejected.
    fn validate(&mut self) -> bool {
        let mut valid = true;
        for selection in &mut self.selections {
            selection.errors.clear();
            match (selection.duration_value, selection.duration_unit) {
                (Some(_), None) => selection.errors.push(FieldError::Required("duration unit")),
                (None, Some(_)) => selection.errors.push(FieldError::Required("duration")),
                _ => {}
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

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s).expect("valid id")
    }

    #[test]
    fn duration_days_uses_unit_multiplier() {
        let mut store = ConditionStore::default();
        store.add(id("htn"), "Hypertension").expect("add");
        store
            .set_duration(&id("htn"), Some(2), Some(OnsetUnit::Years))
            .expect("duration");
        assert_eq!(store.get(&id("htn")).expect("present").duration_days(), Some(730));

        store.set_duration(&id("htn"), None, None).expect("clear");
        assert_eq!(store.get(&id("htn")).expect("present").duration_days(), None);
    }

    #[test]
    fn half_specified_duration_is_invalid() {
        let mut store = ConditionStore::default();
        store.add(id("htn"), "Hypertension").expect("add");
        assert!(store.validate());

        store.set_duration(&id("htn"), Some(3), None).expect("value only");
        assert!(!store.validate());
        assert_eq!(
            store.field_errors()[0].errors,
            vec![FieldError::Required("duration unit")]
        );

        store
            .set_duration(&id("htn"), Some(3), Some(OnsetUnit::Months))
            .expect("complete");
        assert!(store.validate());
    }
}
