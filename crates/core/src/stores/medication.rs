use chrono::{DateTime, Utc};
use consult_types::{ConceptId, NonEmptyText};
use serde::{Deserialize, Serialize};

use super::{ensure_absent, position_of, CategoryStore, FactCategory, FieldError, SelectionErrors, Validate};
use crate::constants::IMMEDIATE_FREQUENCY_CONCEPT;
use crate::quantity::{total_quantity, DurationUnit, Frequency};
use crate::ConsultResult;

/// Route of administration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub concept: ConceptId,
    pub name: String,
}

/// A medication order as edited on the prescription form.
///
/// `total_quantity` is derived and recomputed by the store whenever dose, frequency or
/// duration change.
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationSelection {
    pub drug: ConceptId,
    pub name: NonEmptyText,
    pub dose: Option<f64>,
    pub dose_unit: Option<String>,
    pub frequency: Option<Frequency>,
    pub route: Option<Route>,
    pub duration: Option<f64>,
    pub duration_unit: DurationUnit,
    pub total_quantity: f64,
    /// Dispense unit; falls back to the dose unit when unset.
    pub quantity_unit: Option<String>,
    pub as_needed: bool,
    pub stat: bool,
    pub instructions: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub errors: Vec<FieldError>,
}

impl MedicationSelection {
    fn new(drug: ConceptId, name: NonEmptyText) -> Self {
        Self {
            drug,
            name,
            dose: None,
            dose_unit: None,
            frequency: None,
            route: None,
            duration: None,
            duration_unit: DurationUnit::Days,
            total_quantity: 0.0,
            quantity_unit: None,
            as_needed: false,
            stat: false,
            instructions: None,
            start_date: None,
            errors: Vec::new(),
        }
    }

    pub fn dispense_unit(&self) -> Option<&str> {
        self.quantity_unit.as_deref().or(self.dose_unit.as_deref())
    }

    pub fn is_immediate(&self) -> bool {
        self.frequency.as_ref().is_some_and(|f| f.immediate)
    }

    fn recompute_total(&mut self) {
        self.total_quantity = match &self.frequency {
            Some(frequency) => total_quantity(
                self.dose.unwrap_or(0.0),
                frequency,
                self.duration.unwrap_or(0.0),
                self.duration_unit,
            ),
            None => 0.0,
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MedicationStore {
    selections: Vec<MedicationSelection>,
}

impl MedicationStore {
    pub fn add(&mut self, drug: ConceptId, name: impl AsRef<str>) -> ConsultResult<()> {
        ensure_absent(&self.selections, |s| s.drug == drug, Self::CATEGORY, &drug)?;
        let name = NonEmptyText::new(name)?;
        self.selections.push(MedicationSelection::new(drug, name));
        Ok(())
    }

    pub fn remove(&mut self, drug: &ConceptId) -> ConsultResult<MedicationSelection> {
        let idx = self.index_of(drug)?;
        Ok(self.selections.remove(idx))
    }

    pub fn get(&self, drug: &ConceptId) -> Option<&MedicationSelection> {
        self.selections.iter().find(|s| &s.drug == drug)
    }

    pub fn set_dose(&mut self, drug: &ConceptId, dose: Option<f64>, unit: Option<String>) -> ConsultResult<()> {
        self.edit(drug, |s| {
            s.dose = dose;
            s.dose_unit = unit;
        })
    }

    pub fn set_frequency(&mut self, drug: &ConceptId, frequency: Option<Frequency>) -> ConsultResult<()> {
        self.edit(drug, |s| {
            s.stat = frequency.as_ref().is_some_and(|f| f.immediate);
            s.frequency = frequency;
        })
    }

    pub fn set_duration(&mut self, drug: &ConceptId, duration: Option<f64>, unit: DurationUnit) -> ConsultResult<()> {
        self.edit(drug, |s| {
            s.duration = duration;
            s.duration_unit = unit;
        })
    }

    pub fn set_route(&mut self, drug: &ConceptId, route: Option<Route>) -> ConsultResult<()> {
        self.edit(drug, |s| s.route = route)
    }

    pub fn set_quantity_unit(&mut self, drug: &ConceptId, unit: Option<String>) -> ConsultResult<()> {
        self.edit(drug, |s| s.quantity_unit = unit)
    }

    pub fn set_as_needed(&mut self, drug: &ConceptId, as_needed: bool) -> ConsultResult<()> {
        self.edit(drug, |s| s.as_needed = as_needed)
    }

    /// Flags an order as stat. A stat order is given once, immediately: the frequency
    /// becomes the immediate frequency and the duration is zeroed. Clearing the flag
    /// also clears the immediate frequency.
    pub fn set_stat(&mut self, drug: &ConceptId, stat: bool) -> ConsultResult<()> {
        let immediate = Frequency::immediately(ConceptId::new(IMMEDIATE_FREQUENCY_CONCEPT)?);
        self.edit(drug, |s| {
            s.stat = stat;
            if stat {
                s.frequency = Some(immediate);
                s.duration = Some(0.0);
            } else if s.is_immediate() {
                s.frequency = None;
                s.duration = None;
            }
        })
    }

    pub fn set_instructions(&mut self, drug: &ConceptId, instructions: Option<String>) -> ConsultResult<()> {
        let instructions = instructions
            .map(|i| i.trim().to_owned())
            .filter(|i| !i.is_empty());
        self.edit(drug, |s| s.instructions = instructions)
    }

    pub fn set_start_date(&mut self, drug: &ConceptId, start: Option<DateTime<Utc>>) -> ConsultResult<()> {
        self.edit(drug, |s| s.start_date = start)
    }

    fn edit(&mut self, drug: &ConceptId, f: impl FnOnce(&mut MedicationSelection)) -> ConsultResult<()> {
        let idx = self.index_of(drug)?;
        let selection = &mut self.selections[idx];
        f(selection);
        selection.recompute_total();
        Ok(())
    }

    fn index_of(&self, drug: &ConceptId) -> ConsultResult<usize> {
        position_of(&self.selections, |s| &s.drug == drug, Self::CATEGORY, drug)
    }
}

impl CategoryStore for MedicationStore {
    type Selection = MedicationSelection;

    const CATEGORY: FactCategory = FactCategory::Medication;

    fn selections(&self) -> &[MedicationSelection] {
        &self.selections
    }

    fn reset(&mut self) {
        self.selections.clear();
    }
}

impl Validate for MedicationStore {
    fn validate(&mut self) -> bool {
        let mut valid = true;
        for s in &mut self.selections {
            s.errors.clear();
            match s.dose {
                None => s.errors.push(FieldError::Required("dose")),
                Some(d) if d.is_nan() || d <= 0.0 => s.errors.push(FieldError::MustBePositive("dose")),
                Some(_) => {}
            }
            if s.frequency.is_none() {
                s.errors.push(FieldError::Required("frequency"));
            }
            if s.route.is_none() {
                s.errors.push(FieldError::Required("route"));
            }
            if !s.is_immediate() {
                match s.duration {
                    None => s.errors.push(FieldError::Required("duration")),
                    Some(d) if d.is_nan() || d <= 0.0 => s.errors.push(FieldError::MustBePositive("duration")),
                    Some(_) => {}
                }
            }
            valid &= s.errors.is_empty();
        }
        valid
    }

    fn field_errors(&self) -> Vec<SelectionErrors> {
        self.selections
            .iter()
            .filter(|s| !s.errors.is_empty())
            .map(|s| SelectionErrors {
                category: Self::CATEGORY,
                concept: s.drug.clone(),
                name: s.name.to_string(),
                errors: s.errors.clone(),
            })
            .collect()
    }
}
