//! Encounter context and session state for one consultation.
//!
//! The encounter is the parent record every clinical fact in a submission links to. Its
//! context is edited alongside the fact stores while the consultation is open and is owned
//! by an [`EncounterSession`] until the consultation is submitted or cancelled.

use chrono::{DateTime, Utc};
use consult_types::ConceptId;
use fhir::encounter::{ambulatory_class, EncounterLocation, EncounterParticipant};
use fhir::{BundleEntry, CodeableConcept, Encounter, EncounterStatus, Period, Reference, Resource};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::reference::{EncounterReference, SubmissionVerb};

/// The encounter being recorded, as currently edited.
///
/// Prerequisites may be missing while the consultation is being filled in;
/// [`EncounterContext::complete`] is the structural check that they are all present.
#[derive(Clone, Debug, PartialEq)]
pub struct EncounterContext {
    /// Identifier of an encounter that already exists for this visit. `None` means the
    /// encounter is created by the submission.
    pub encounter_id: Option<ConceptId>,
    pub patient: Option<ConceptId>,
    pub visit: Option<ConceptId>,
    pub location: Option<ConceptId>,
    pub encounter_type: Option<ConceptId>,
    /// The practitioner recording the consultation.
    pub practitioner: Option<ConceptId>,
    pub participants: Vec<ConceptId>,
    pub consultation_date: DateTime<Utc>,
}

/// A structural prerequisite that is absent from an [`EncounterContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MissingField {
    Patient,
    Practitioner,
    Visit,
    Location,
    EncounterType,
    Participants,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MissingField::Patient => "patient",
            MissingField::Practitioner => "practitioner",
            MissingField::Visit => "visit",
            MissingField::Location => "location",
            MissingField::EncounterType => "encounter type",
            MissingField::Participants => "participants",
        };
        f.write_str(name)
    }
}

/// An encounter context whose structural prerequisites are all present.
#[derive(Clone, Debug, PartialEq)]
pub struct CompleteEncounter {
    pub encounter_id: Option<ConceptId>,
    pub patient: ConceptId,
    pub visit: ConceptId,
    pub location: ConceptId,
    pub encounter_type: ConceptId,
    pub practitioner: ConceptId,
    pub participants: Vec<ConceptId>,
    pub consultation_date: DateTime<Utc>,
}

impl EncounterContext {
    /// A context for a new encounter with nothing filled in yet.
    pub fn new(consultation_date: DateTime<Utc>) -> Self {
        Self {
            encounter_id: None,
            patient: None,
            visit: None,
            location: None,
            encounter_type: None,
            practitioner: None,
            participants: Vec::new(),
            consultation_date,
        }
    }

    /// Structural completeness check.
    ///
    /// # Errors
    ///
    /// Returns every missing prerequisite, in a fixed order.
    pub fn complete(&self) -> Result<CompleteEncounter, Vec<MissingField>> {
        let mut missing = Vec::new();
        if self.patient.is_none() {
            missing.push(MissingField::Patient);
        }
        if self.practitioner.is_none() {
            missing.push(MissingField::Practitioner);
        }
        if self.visit.is_none() {
            missing.push(MissingField::Visit);
        }
        if self.location.is_none() {
            missing.push(MissingField::Location);
        }
        if self.encounter_type.is_none() {
            missing.push(MissingField::EncounterType);
        }
        if self.participants.is_empty() {
            missing.push(MissingField::Participants);
        }

        match (
            &self.patient,
            &self.practitioner,
            &self.visit,
            &self.location,
            &self.encounter_type,
        ) {
            (Some(patient), Some(practitioner), Some(visit), Some(location), Some(encounter_type))
                if missing.is_empty() =>
            {
                Ok(CompleteEncounter {
                    encounter_id: self.encounter_id.clone(),
                    patient: patient.clone(),
                    visit: visit.clone(),
                    location: location.clone(),
                    encounter_type: encounter_type.clone(),
                    practitioner: practitioner.clone(),
                    participants: self.participants.clone(),
                    consultation_date: self.consultation_date,
                })
            }
            _ => Err(missing),
        }
    }
}

impl CompleteEncounter {
    pub fn patient_reference(&self) -> String {
        self.patient.reference("Patient")
    }

    pub fn practitioner_reference(&self) -> String {
        self.practitioner.reference("Practitioner")
    }

    /// Builds the encounter resource for this context.
    pub fn to_resource(&self) -> Encounter {
        Encounter {
            id: self.encounter_id.as_ref().map(|id| id.as_str().to_owned()),
            status: EncounterStatus::InProgress,
            class: ambulatory_class(),
            encounter_type: vec![CodeableConcept::concept(self.encounter_type.as_str(), None)],
            subject: Reference::resource("Patient", &self.patient),
            participant: self
                .participants
                .iter()
                .map(|p| EncounterParticipant {
                    individual: Reference::resource("Practitioner", p),
                })
                .collect(),
            location: vec![EncounterLocation {
                location: Reference::resource("Location", &self.location),
            }],
            period: Some(Period {
                start: Some(self.consultation_date),
                end: None,
            }),
            part_of: Some(Reference::resource("Encounter", &self.visit)),
        }
    }

    /// The bundle entry for the encounter, using the verb and token already resolved for
    /// this submission.
    pub fn to_entry(&self, reference: &EncounterReference) -> BundleEntry {
        let resource = Resource::Encounter(self.to_resource());
        match reference.verb {
            SubmissionVerb::Create => BundleEntry::create(reference.token.clone(), resource),
            SubmissionVerb::Amend => BundleEntry::amend(reference.token.clone(), resource),
        }
    }
}

/// Owner of the encounter context for the consultation currently open.
///
/// A session is started when the consultation opens and ended on successful submission
/// or cancellation.
#[derive(Debug, Default)]
pub struct EncounterSession {
    context: Mutex<Option<EncounterContext>>,
}

impl EncounterSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session, replacing any previous context.
    pub fn start(&self, context: EncounterContext) {
        *self.lock() = Some(context);
    }

    /// Applies an edit to the open context. Returns `false` if no session is open.
    pub fn update(&self, edit: impl FnOnce(&mut EncounterContext)) -> bool {
        match self.lock().as_mut() {
            Some(ctx) => {
                edit(ctx);
                true
            }
            None => false,
        }
    }

    /// A copy of the open context, if any.
    pub fn snapshot(&self) -> Option<EncounterContext> {
        self.lock().clone()
    }

    /// Identifier of the encounter that already exists for this visit, if any.
    pub fn active_encounter_id(&self) -> Option<ConceptId> {
        self.lock().as_ref().and_then(|ctx| ctx.encounter_id.clone())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Ends the session and discards its context.
    pub fn end(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<EncounterContext>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s).expect("valid id")
    }

    fn full_context() -> EncounterContext {
        EncounterContext {
            encounter_id: None,
            patient: Some(id("patient-1")),
            visit: Some(id("visit-1")),
            location: Some(id("opd-1")),
            encounter_type: Some(id("consultation")),
            practitioner: Some(id("dr-1")),
            participants: vec![id("dr-1")],
            consultation_date: "2025-03-01T09:30:00Z".parse().expect("timestamp"),
        }
    }

    #[test]
    fn complete_context_passes_structural_check() {
        let complete = full_context().complete().expect("complete");
        assert_eq!(complete.patient_reference(), "Patient/patient-1");
        assert_eq!(complete.practitioner_reference(), "Practitioner/dr-1");
    }

    #[test]
    fn structural_check_reports_every_missing_field() {
        let ctx = EncounterContext::new("2025-03-01T09:30:00Z".parse().expect("timestamp"));
        let missing = ctx.complete().expect_err("incomplete");
        assert_eq!(
            missing,
            vec![
                MissingField::Patient,
                MissingField::Practitioner,
                MissingField::Visit,
                MissingField::Location,
                MissingField::EncounterType,
                MissingField::Participants,
            ]
        );
    }

    #[test]
    fn structural_check_requires_a_participant() {
        let mut ctx = full_context();
        ctx.participants.clear();
        assert_eq!(ctx.complete().expect_err("no participants"), vec![MissingField::Participants]);
    }

    #[test]
    fn encounter_resource_links_patient_visit_and_location() {
        let resource = full_context().complete().expect("complete").to_resource();
        assert_eq!(resource.id, None);
        assert_eq!(resource.subject.as_str(), Some("Patient/patient-1"));
        assert_eq!(resource.part_of.as_ref().and_then(|r| r.as_str()), Some("Encounter/visit-1"));
        assert_eq!(resource.location[0].location.as_str(), Some("Location/opd-1"));
        assert_eq!(resource.participant.len(), 1);
        assert_eq!(resource.encounter_type[0].first_code(), Some("consultation"));
    }

    #[test]
    fn session_lifecycle() {
        let session = EncounterSession::new();
        assert!(!session.is_active());
        assert!(!session.update(|ctx| ctx.encounter_id = Some(id("enc-1"))));

        session.start(full_context());
        assert!(session.is_active());
        assert_eq!(session.active_encounter_id(), None);

        assert!(session.update(|ctx| ctx.encounter_id = Some(id("enc-1"))));
        assert_eq!(session.active_encounter_id(), Some(id("enc-1")));

        session.end();
        assert!(!session.is_active());
        assert_eq!(session.snapshot(), None);
    }
}
