//! Bundle assembly.
//!
//! The encounter entry always comes first, followed by the fact entries in a fixed
//! category order: diagnoses, allergies, conditions, investigation orders, medications.

use chrono::{DateTime, Utc};
use fhir::{Bundle, BundleEntry};

use crate::encounter::CompleteEncounter;
use crate::mappers::{
    map_allergies, map_conditions, map_diagnoses, map_investigations, map_medications,
    MappingContext,
};
use crate::reference::EncounterReference;
use crate::stores::{CategoryStore, ConsultationStores};

/// Mapped fact entries, one field per category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FactEntries {
    pub diagnoses: Vec<BundleEntry>,
    pub allergies: Vec<BundleEntry>,
    pub conditions: Vec<BundleEntry>,
    pub investigations: Vec<BundleEntry>,
    pub medications: Vec<BundleEntry>,
}

impl FactEntries {
    /// Runs every mapper over the current store contents.
    pub fn map(stores: &ConsultationStores, ctx: &MappingContext) -> Self {
        Self {
            diagnoses: stores.diagnoses.read(|s| map_diagnoses(s.selections(), ctx)),
            allergies: stores.allergies.read(|s| map_allergies(s.selections(), ctx)),
            conditions: stores.conditions.read(|s| map_conditions(s.selections(), ctx)),
            investigations: stores
                .investigations
                .read(|s| map_investigations(&s.groups(), ctx)),
            medications: stores.medications.read(|s| map_medications(s.selections(), ctx)),
        }
    }

    pub fn len(&self) -> usize {
        self.diagnoses.len()
            + self.allergies.len()
            + self.conditions.len()
            + self.investigations.len()
            + self.medications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concatenates the encounter entry and fact entries into a transaction bundle.
pub fn assemble(encounter: BundleEntry, facts: FactEntries, timestamp: DateTime<Utc>) -> Bundle {
    let mut bundle = Bundle::transaction(Some(timestamp));
    bundle.entry.reserve(1 + facts.len());
    bundle.entry.push(encounter);
    bundle.entry.extend(facts.diagnoses);
    bundle.entry.extend(facts.allergies);
    bundle.entry.extend(facts.conditions);
    bundle.entry.extend(facts.investigations);
    bundle.entry.extend(facts.medications);
    bundle
}

/// A bundle together with the encounter reference it was built around.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedBundle {
    pub reference: EncounterReference,
    pub bundle: Bundle,
}

/// Resolves the encounter reference, maps every store and assembles the bundle.
pub fn compose(
    encounter: &CompleteEncounter,
    stores: &ConsultationStores,
    timestamp: DateTime<Utc>,
) -> ComposedBundle {
    compose_for(encounter, encounter.resolve_reference(), stores, timestamp)
}

/// Maps every store against an already resolved reference and assembles the bundle.
pub fn compose_for(
    encounter: &CompleteEncounter,
    reference: EncounterReference,
    stores: &ConsultationStores,
    timestamp: DateTime<Utc>,
) -> ComposedBundle {
    let ctx = MappingContext::new(encounter, &reference);
    let facts = FactEntries::map(stores, &ctx);
    let bundle = assemble(encounter.to_entry(&reference), facts, timestamp);
    ComposedBundle { reference, bundle }
}
