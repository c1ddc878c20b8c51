//! Per-category selection stores and their validators.
//!
//! Each clinical category keeps its own store for the lifetime of a consultation. Stores
//! are held in [`SharedStore`] containers so the editing surface and the submitter can
//! both reach them; the submitter only reads, validates and resets them.

use consult_types::ConceptId;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ConsultError, ConsultResult};

pub mod allergy;
pub mod condition;
pub mod diagnosis;
pub mod investigation;
pub mod medication;

pub use allergy::{AllergySelection, AllergyStore};
pub use condition::{ConditionSelection, ConditionStore, OnsetUnit};
pub use diagnosis::{Certainty, DiagnosisSelection, DiagnosisStore};
pub use investigation::{InvestigationGroup, InvestigationOrder, InvestigationStore, OrderPriority};
pub use medication::{MedicationSelection, MedicationStore, Route};

/// The five clinical fact categories, in bundle order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FactCategory {
    Diagnosis,
    Allergy,
    Condition,
    Investigation,
    Medication,
}

impl std::fmt::Display for FactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FactCategory::Diagnosis => "diagnosis",
            FactCategory::Allergy => "allergy",
            FactCategory::Condition => "condition",
            FactCategory::Investigation => "investigation",
            FactCategory::Medication => "medication",
        };
        f.write_str(label)
    }
}

/// A per-field validation failure shown against one selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldError {
    Required(&'static str),
    MustBePositive(&'static str),
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::Required(field) => write!(f, "{field} is required"),
            FieldError::MustBePositive(field) => write!(f, "{field} must be greater than zero"),
        }
    }
}

/// The field errors currently attached to one selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionErrors {
    pub category: FactCategory,
    pub concept: ConceptId,
    pub name: String,
    pub errors: Vec<FieldError>,
}

/// Common surface of every category store.
pub trait CategoryStore {
    type Selection;

    const CATEGORY: FactCategory;

    fn selections(&self) -> &[Self::Selection];

    /// Discards every selection.
    fn reset(&mut self);

    fn is_empty(&self) -> bool {
        self.selections().is_empty()
    }

    fn len(&self) -> usize {
        self.selections().len()
    }
}

/// A category store that validates its own selections.
pub trait Validate {
    /// Recomputes the field errors of every selection and returns whether all are valid.
    fn validate(&mut self) -> bool;

    /// Field errors left by the last [`Validate::validate`] call.
    fn field_errors(&self) -> Vec<SelectionErrors>;
}

/// Mutex-guarded container for one category store.
///
/// Guards never escape the closures passed to [`SharedStore::read`] and
/// [`SharedStore::update`], so a store lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct SharedStore<S> {
    inner: Mutex<S>,
}

impl<S> SharedStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Clone> SharedStore<S> {
    pub fn snapshot(&self) -> S {
        self.lock().clone()
    }
}

/// All category stores of one consultation.
#[derive(Debug, Default)]
pub struct ConsultationStores {
    pub diagnoses: SharedStore<DiagnosisStore>,
    pub allergies: SharedStore<AllergyStore>,
    pub conditions: SharedStore<ConditionStore>,
    pub investigations: SharedStore<InvestigationStore>,
    pub medications: SharedStore<MedicationStore>,
}

impl ConsultationStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every category validator. All validators run even after one fails so that
    /// each store carries its own field errors.
    pub fn validate_all(&self) -> bool {
        let results = [
            self.diagnoses.update(Validate::validate),
            self.conditions.update(Validate::validate),
            self.allergies.update(Validate::validate),
            self.medications.update(Validate::validate),
        ];
        results.iter().all(|valid| *valid)
    }

    /// Field errors of every validated store, in bundle order.
    pub fn field_errors(&self) -> Vec<SelectionErrors> {
        let mut errors = self.diagnoses.read(Validate::field_errors);
        errors.extend(self.allergies.read(Validate::field_errors));
        errors.extend(self.conditions.read(Validate::field_errors));
        errors.extend(self.medications.read(Validate::field_errors));
        errors
    }

    pub fn reset_all(&self) {
        self.diagnoses.update(CategoryStore::reset);
        self.allergies.update(CategoryStore::reset);
        self.conditions.update(CategoryStore::reset);
        self.investigations.update(CategoryStore::reset);
        self.medications.update(CategoryStore::reset);
    }

    pub fn all_empty(&self) -> bool {
        self.diagnoses.read(CategoryStore::is_empty)
            && self.allergies.read(CategoryStore::is_empty)
            && self.conditions.read(CategoryStore::is_empty)
            && self.investigations.read(CategoryStore::is_empty)
            && self.medications.read(CategoryStore::is_empty)
    }

    /// Number of selections per category, in bundle order.
    pub fn counts(&self) -> [(FactCategory, usize); 5] {
        [
            (FactCategory::Diagnosis, self.diagnoses.read(CategoryStore::len)),
            (FactCategory::Allergy, self.allergies.read(CategoryStore::len)),
            (FactCategory::Condition, self.conditions.read(CategoryStore::len)),
            (
                FactCategory::Investigation,
                self.investigations.read(CategoryStore::len),
            ),
            (FactCategory::Medication, self.medications.read(CategoryStore::len)),
        ]
    }
}

pub(crate) fn ensure_absent<T>(
    items: &[T],
    key: impl Fn(&T) -> bool,
    category: FactCategory,
    concept: &ConceptId,
) -> ConsultResult<()> {
    if items.iter().any(key) {
        return Err(ConsultError::DuplicateSelection {
            category,
            concept: concept.clone(),
        });
    }
    Ok(())
}

pub(crate) fn position_of<T>(
    items: &[T],
    key: impl Fn(&T) -> bool,
    category: FactCategory,
    concept: &ConceptId,
) -> ConsultResult<usize> {
    items
        .iter()
        .position(key)
        .ok_or_else(|| ConsultError::UnknownSelection {
            category,
            concept: concept.clone(),
        })
}
