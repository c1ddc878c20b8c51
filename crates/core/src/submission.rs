//! Consultation submission.
//!
//! [`ConsultationSubmitter`] drives one consultation from the submit action to a terminal
//! outcome:
//!
//! ```text
//! Idle -> Validating -> Submitting -> Idle (stores reset, session ended)
//!            |               |
//!            v               v
//!          Idle            Idle (stores preserved)
//! ```
//!
//! The state guard is checked and set before any asynchronous work starts, so at most one
//! submission is in flight. The network call is the only suspension point.

use chrono::Utc;
use fhir::{AcknowledgedBundle, ResourceLocation};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::assembler::compose_for;
use crate::constants::{SUBMITTED_MESSAGE, SUBMITTED_TITLE, SUBMIT_FAILED_FALLBACK, SUBMIT_FAILED_TITLE};
use crate::encounter::{CompleteEncounter, EncounterSession, MissingField};
use crate::reference::{resolve_encounter_reference, EncounterReference, SubmissionVerb};
use crate::sinks::{AuditEventType, AuditSink, NotificationKind, NotificationSink};
use crate::stores::{ConsultationStores, SelectionErrors};
use crate::transport::SubmissionTransport;
use crate::ConsultError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// Why a submit request was ignored without doing anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another submission is already running.
    Busy(SubmissionState),
    /// No consultation is open.
    NoSession,
    /// The encounter context is missing prerequisites.
    Incomplete(Vec<MissingField>),
}

/// What the server acknowledged for a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub verb: SubmissionVerb,
    /// Token the bundle used for the encounter.
    pub encounter_token: String,
    /// Server identifier of the encounter, when known.
    pub encounter_id: Option<String>,
    pub entry_count: usize,
    pub locations: Vec<ResourceLocation>,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    Ignored(IgnoreReason),
    /// At least one category validator failed; nothing was sent.
    Invalid(Vec<SelectionErrors>),
    /// The submission was sent and failed; every selection is preserved.
    Failed(ConsultError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    RefusedWhileSubmitting,
}

/// Orchestrates submission of the open consultation.
///
/// The submitter borrows the session, the stores and the collaborators; it owns only its
/// state guard.
pub struct ConsultationSubmitter<'a> {
    session: &'a EncounterSession,
    stores: &'a ConsultationStores,
    transport: &'a dyn SubmissionTransport,
    notifier: &'a dyn NotificationSink,
    audit: &'a dyn AuditSink,
    state: Mutex<SubmissionState>,
}

impl<'a> ConsultationSubmitter<'a> {
    pub fn new(
        session: &'a EncounterSession,
        stores: &'a ConsultationStores,
        transport: &'a dyn SubmissionTransport,
        notifier: &'a dyn NotificationSink,
        audit: &'a dyn AuditSink,
    ) -> Self {
        Self {
            session,
            stores,
            transport,
            notifier,
            audit,
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.lock_state()
    }

    /// Runs one submission attempt.
    ///
    /// Never fails outright: every failure is reported through [`SubmitOutcome`] and
    /// leaves the submitter idle.
    pub async fn submit(&self) -> SubmitOutcome {
        let encounter = match self.begin() {
            Ok(encounter) => encounter,
            Err(reason) => return SubmitOutcome::Ignored(reason),
        };

        if !self.stores.validate_all() {
            let errors = self.stores.field_errors();
            tracing::info!(invalid = errors.len(), "consultation failed validation");
            self.set_state(SubmissionState::Idle);
            return SubmitOutcome::Invalid(errors);
        }

        self.set_state(SubmissionState::Submitting);
        let reference = resolve_encounter_reference(self.session.active_encounter_id().as_ref());
        let composed = compose_for(&encounter, reference, self.stores, Utc::now());
        let entry_count = composed.bundle.entry.len();
        tracing::info!(
            verb = ?composed.reference.verb,
            entries = entry_count,
            "submitting consultation"
        );

        match self.transport.submit(&composed.bundle).await {
            Ok(ack) => {
                let receipt = receipt(&encounter, composed.reference, entry_count, ack);
                self.stores.reset_all();
                self.session.end();
                self.set_state(SubmissionState::Idle);
                tracing::info!(encounter = ?receipt.encounter_id, "consultation submitted");

                self.notifier
                    .notify(SUBMITTED_TITLE, SUBMITTED_MESSAGE, NotificationKind::Success);
                self.record_audit(&encounter, &receipt);
                SubmitOutcome::Submitted(receipt)
            }
            Err(err) => {
                self.set_state(SubmissionState::Idle);
                tracing::error!(error = %err, "consultation submission failed");

                let message = match &err {
                    ConsultError::Rejected { message, .. } => message.as_str(),
                    _ => SUBMIT_FAILED_FALLBACK,
                };
                self.notifier
                    .notify(SUBMIT_FAILED_TITLE, message, NotificationKind::Error);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Discards the open consultation. Refused while a submission is running.
    pub fn cancel(&self) -> CancelOutcome {
        let state = self.lock_state();
        if *state != SubmissionState::Idle {
            tracing::warn!(state = ?*state, "cancel refused while a submission is running");
            return CancelOutcome::RefusedWhileSubmitting;
        }
        self.stores.reset_all();
        self.session.end();
        tracing::info!("consultation cancelled");
        CancelOutcome::Cancelled
    }

    /// Checks the guard and the structural prerequisites, then moves to `Validating`.
    fn begin(&self) -> Result<CompleteEncounter, IgnoreReason> {
        let mut state = self.lock_state();
        if *state != SubmissionState::Idle {
            tracing::debug!(state = ?*state, "submit ignored, submission already running");
            return Err(IgnoreReason::Busy(*state));
        }
        let context = self.session.snapshot().ok_or(IgnoreReason::NoSession)?;
        let encounter = context.complete().map_err(|missing| {
            tracing::debug!(?missing, "submit ignored, encounter context incomplete");
            IgnoreReason::Incomplete(missing)
        })?;
        *state = SubmissionState::Validating;
        Ok(encounter)
    }

    fn record_audit(&self, encounter: &CompleteEncounter, receipt: &SubmissionReceipt) {
        let event_type = match receipt.verb {
            SubmissionVerb::Create => AuditEventType::CreateEncounter,
            SubmissionVerb::Amend => AuditEventType::EditEncounter,
        };
        let mut params = BTreeMap::new();
        params.insert(
            "encounterUuid".to_owned(),
            receipt
                .encounter_id
                .clone()
                .unwrap_or_else(|| receipt.encounter_token.clone()),
        );
        params.insert("visitUuid".to_owned(), encounter.visit.to_string());

        if let Err(err) = self.audit.record(event_type, encounter.patient.as_str(), &params) {
            tracing::warn!(error = %err, event = %event_type, "failed to record audit event");
        }
    }

    fn set_state(&self, next: SubmissionState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn receipt(
    encounter: &CompleteEncounter,
    reference: EncounterReference,
    entry_count: usize,
    ack: AcknowledgedBundle,
) -> SubmissionReceipt {
    let encounter_id = ack
        .first_id_of("Encounter")
        .map(str::to_owned)
        .or_else(|| encounter.encounter_id.as_ref().map(|id| id.to_string()));
    SubmissionReceipt {
        verb: reference.verb,
        encounter_token: reference.token,
        encounter_id,
        entry_count,
        locations: ack.assigned().cloned().collect(),
    }
}
