//! Consultation drafts.
//!
//! A draft is a YAML document describing an encounter context and every selection of a
//! consultation. It is parsed strictly and then replayed into an [`EncounterSession`] and
//! [`ConsultationStores`] through the same store operations an editing surface would use,
//! so duplicate rejection and quantity computation apply exactly as they do interactively.

use chrono::{DateTime, Utc};
use consult_types::ConceptId;
use fhir::{AllergyCategory, ReactionSeverity};
use serde::Deserialize;
use std::path::Path;

use crate::encounter::{EncounterContext, EncounterSession};
use crate::quantity::{DurationUnit, Frequency};
use crate::stores::{Certainty, ConsultationStores, OnsetUnit, OrderPriority, Route};
use crate::{ConsultError, ConsultResult};

/// A parsed consultation draft.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsultationDraft {
    pub encounter: EncounterDraft,
    #[serde(default)]
    pub diagnoses: Vec<DiagnosisDraft>,
    #[serde(default)]
    pub allergies: Vec<AllergyDraft>,
    #[serde(default)]
    pub conditions: Vec<ConditionDraft>,
    #[serde(default)]
    pub investigations: Vec<InvestigationDraft>,
    #[serde(default)]
    pub medications: Vec<MedicationDraft>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncounterDraft {
    #[serde(default)]
    pub id: Option<ConceptId>,
    #[serde(default)]
    pub patient: Option<ConceptId>,
    #[serde(default)]
    pub visit: Option<ConceptId>,
    #[serde(default)]
    pub location: Option<ConceptId>,
    #[serde(default, rename = "type")]
    pub encounter_type: Option<ConceptId>,
    #[serde(default)]
    pub practitioner: Option<ConceptId>,
    #[serde(default)]
    pub participants: Vec<ConceptId>,
    /// Defaults to the time the draft is applied.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosisDraft {
    pub concept: ConceptId,
    pub name: String,
    #[serde(default)]
    pub certainty: Option<Certainty>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllergyDraft {
    pub concept: ConceptId,
    pub name: String,
    pub category: AllergyCategory,
    #[serde(default)]
    pub severity: Option<ReactionSeverity>,
    #[serde(default)]
    pub reactions: Vec<ConceptId>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDraft {
    pub concept: ConceptId,
    pub name: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub unit: Option<OnsetUnit>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvestigationDraft {
    pub category: String,
    #[serde(default)]
    pub category_concept: Option<ConceptId>,
    pub concept: ConceptId,
    pub name: String,
    #[serde(default)]
    pub priority: Option<OrderPriority>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrequencyDraft {
    pub concept: ConceptId,
    pub name: String,
    /// Doses per day. Looked up from the standard frequencies by name when absent.
    #[serde(default)]
    pub per_day: Option<f64>,
}

impl FrequencyDraft {
    fn resolve(&self) -> ConsultResult<Frequency> {
        match self.per_day {
            None => Frequency::standard(self.concept.clone(), &self.name).ok_or_else(|| {
                ConsultError::InvalidDraft(format!(
                    "unknown frequency '{}'; give per_day explicitly",
                    self.name
                ))
            }),
            Some(per_day) if per_day.is_finite() && per_day > 0.0 => {
                Ok(Frequency::per_day(self.concept.clone(), self.name.trim(), per_day))
            }
            Some(per_day) => Err(ConsultError::InvalidDraft(format!(
                "frequency '{}' has invalid per_day {per_day}",
                self.name
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicationDraft {
    pub drug: ConceptId,
    pub name: String,
    #[serde(default)]
    pub dose: Option<f64>,
    #[serde(default)]
    pub dose_unit: Option<String>,
    #[serde(default)]
    pub frequency: Option<FrequencyDraft>,
    #[serde(default)]
    pub route: Option<Route>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    #[serde(default)]
    pub quantity_unit: Option<String>,
    #[serde(default)]
    pub as_needed: bool,
    #[serde(default)]
    pub stat: bool,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

impl ConsultationDraft {
    /// Strictly parses a draft from YAML text.
    ///
    /// This uses `serde_path_to_error` to report the path (e.g. `medications[0].dose`) of
    /// the failing field when the YAML does not match the draft schema.
    ///
    /// # Errors
    ///
    /// Returns `ConsultError::InvalidDraft` if the YAML is malformed, a field has an
    /// unexpected type, or an unknown key is present.
    pub fn parse(yaml_text: &str) -> ConsultResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        match serde_path_to_error::deserialize(deserializer) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                Err(ConsultError::InvalidDraft(format!(
                    "schema mismatch at {path}: {source}"
                )))
            }
        }
    }

    /// Reads and parses a draft file.
    pub fn load(path: &Path) -> ConsultResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ConsultError::DraftRead)?;
        Self::parse(&text)
    }

    /// Opens a session for the draft's encounter and replays every selection into the
    /// stores.
    ///
    /// # Errors
    ///
    /// Returns the first store error, such as a duplicate selection, or
    /// `ConsultError::InvalidDraft` for an unresolvable frequency. Stores may hold the
    /// selections applied before the failing one.
    pub fn apply(
        &self,
        session: &EncounterSession,
        stores: &ConsultationStores,
        now: DateTime<Utc>,
    ) -> ConsultResult<()> {
        let enc = &self.encounter;
        session.start(EncounterContext {
            encounter_id: enc.id.clone(),
            patient: enc.patient.clone(),
            visit: enc.visit.clone(),
            location: enc.location.clone(),
            encounter_type: enc.encounter_type.clone(),
            practitioner: enc.practitioner.clone(),
            participants: enc.participants.clone(),
            consultation_date: enc.date.unwrap_or(now),
        });

        stores.diagnoses.update(|store| {
            for dx in &self.diagnoses {
                store.add(dx.concept.clone(), &dx.name)?;
                if let Some(certainty) = dx.certainty {
                    store.set_certainty(&dx.concept, certainty)?;
                }
            }
            Ok::<_, ConsultError>(())
        })?;

        stores.allergies.update(|store| {
            for allergy in &self.allergies {
                store.add(allergy.concept.clone(), &allergy.name, allergy.category)?;
                if let Some(severity) = allergy.severity {
                    store.set_severity(&allergy.concept, severity)?;
                }
                for reaction in &allergy.reactions {
                    store.add_reaction(&allergy.concept, reaction.clone())?;
                }
                store.set_note(&allergy.concept, allergy.note.clone())?;
            }
            Ok::<_, ConsultError>(())
        })?;

        stores.conditions.update(|store| {
            for condition in &self.conditions {
                store.add(condition.concept.clone(), &condition.name)?;
                store.set_duration(&condition.concept, condition.duration, condition.unit)?;
            }
            Ok::<_, ConsultError>(())
        })?;

        stores.investigations.update(|store| {
            for order in &self.investigations {
                store.add(
                    &order.category,
                    order.category_concept.clone(),
                    order.concept.clone(),
                    &order.name,
                )?;
                if let Some(priority) = order.priority {
                    store.set_priority(&order.concept, priority)?;
                }
            }
            Ok::<_, ConsultError>(())
        })?;

        stores.medications.update(|store| {
            for med in &self.medications {
                let frequency = med.frequency.as_ref().map(FrequencyDraft::resolve).transpose()?;
                store.add(med.drug.clone(), &med.name)?;
                store.set_dose(&med.drug, med.dose, med.dose_unit.clone())?;
                store.set_frequency(&med.drug, frequency)?;
                store.set_duration(&med.drug, med.duration, med.duration_unit)?;
                store.set_route(&med.drug, med.route.clone())?;
                store.set_quantity_unit(&med.drug, med.quantity_unit.clone())?;
                store.set_as_needed(&med.drug, med.as_needed)?;
                store.set_instructions(&med.drug, med.instructions.clone())?;
                store.set_start_date(&med.drug, med.start_date)?;
                if med.stat {
                    store.set_stat(&med.drug, true)?;
                }
            }
            Ok::<_, ConsultError>(())
        })?;

        tracing::debug!(counts = ?stores.counts(), "consultation draft applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{CategoryStore, FactCategory};

    const DRAFT: &str = r#"
encounter:
  patient: patient-1
  visit: visit-1
  location: opd-1
  type: consultation
  practitioner: dr-1
  participants: [dr-1]
  date: 2025-03-01T09:30:00Z
diagnoses:
  - concept: dx-1
    name: Malaria
    certainty: provisional
allergies:
  - concept: alg-1
    name: Penicillin
    category: medication
    severity: severe
    reactions: [rash, anaphylaxis]
conditions:
  - concept: htn
    name: Hypertension
    duration: 2
    unit: years
investigations:
  - category: Laboratory
    concept: cbc
    name: Complete blood count
    priority: stat
medications:
  - drug: amox-500
    name: Amoxicillin 500mg
    dose: 1
    dose_unit: Capsule(s)
    frequency:
      concept: tds
      name: Thrice a day
    route:
      concept: oral
      name: Oral
    duration: 5
    duration_unit: days
"#;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s).expect("valid id")
    }

    #[test]
    fn parses_and_applies_a_full_draft() {
        let draft = ConsultationDraft::parse(DRAFT).expect("parse");
        let session = EncounterSession::new();
        let stores = ConsultationStores::new();
        draft.apply(&session, &stores, Utc::now()).expect("apply");

        let ctx = session.snapshot().expect("session open");
        assert_eq!(ctx.patient, Some(id("patient-1")));
        assert_eq!(ctx.consultation_date.to_rfc3339(), "2025-03-01T09:30:00+00:00");
        assert!(ctx.complete().is_ok());

        assert_eq!(
            stores.counts(),
            [
                (FactCategory::Diagnosis, 1),
                (FactCategory::Allergy, 1),
                (FactCategory::Condition, 1),
                (FactCategory::Investigation, 1),
                (FactCategory::Medication, 1),
            ]
        );
        let total = stores
            .medications
            .read(|s| s.get(&id("amox-500")).map(|m| m.total_quantity));
        assert_eq!(total, Some(15.0));
        assert!(stores.validate_all());
    }

    #[test]
    fn unknown_key_reports_its_path() {
        let yaml = "encounter:\n  patient: p\nmedications:\n  - drug: d\n    name: D\n    dosage: 2\n";
        let err = ConsultationDraft::parse(yaml).expect_err("unknown key");
        let ConsultError::InvalidDraft(msg) = err else {
            panic!("expected InvalidDraft");
        };
        assert!(msg.contains("medications[0]"), "{msg}");
        assert!(msg.contains("dosage"), "{msg}");
    }

    #[test]
    fn duplicate_selection_is_rejected_during_apply() {
        let yaml = r#"
encounter: {}
diagnoses:
  - {concept: dx-1, name: Malaria}
  - {concept: dx-1, name: Malaria}
"#;
        let draft = ConsultationDraft::parse(yaml).expect("parse");
        let err = draft
            .apply(&EncounterSession::new(), &ConsultationStores::new(), Utc::now())
            .expect_err("duplicate");
        assert!(matches!(
            err,
            ConsultError::DuplicateSelection { category: FactCategory::Diagnosis, .. }
        ));
    }

    #[test]
    fn unknown_frequency_without_per_day_is_rejected() {
        let yaml = r#"
encounter: {}
medications:
  - drug: pcm
    name: Paracetamol
    frequency: {concept: f, name: Whenever}
"#;
        let draft = ConsultationDraft::parse(yaml).expect("parse");
        let err = draft
            .apply(&EncounterSession::new(), &ConsultationStores::new(), Utc::now())
            .expect_err("unknown frequency");
        assert!(matches!(err, ConsultError::InvalidDraft(msg) if msg.contains("Whenever")));
    }

    #[test]
    fn stat_flag_overrides_frequency() {
        let yaml = r#"
encounter: {}
medications:
  - drug: adr
    name: Adrenaline
    dose: 0.5
    dose_unit: mg
    route: {concept: im, name: Intramuscular}
    stat: true
"#;
        let draft = ConsultationDraft::parse(yaml).expect("parse");
        let stores = ConsultationStores::new();
        draft
            .apply(&EncounterSession::new(), &stores, Utc::now())
            .expect("apply");
        let med = stores.medications.read(|s| s.selections()[0].clone());
        assert!(med.stat);
        assert!(med.is_immediate());
        assert_eq!(med.total_quantity, 0.5);
    }
}
