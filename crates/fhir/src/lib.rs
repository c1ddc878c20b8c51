//! FHIR wire/boundary support for consultation submissions.
//!
//! This crate provides **wire models** and **format/translation helpers** for the FHIR R4
//! resources a consultation produces:
//! - `Encounter` (the parent record)
//! - `Condition` (encounter diagnoses and problem-list conditions)
//! - `AllergyIntolerance`
//! - `ServiceRequest` (investigation orders)
//! - `MedicationRequest` (medication orders)
//! - the transaction `Bundle` that carries them, and the server's transaction response
//!
//! This crate focuses on:
//! - FHIR JSON serialisation/deserialisation
//! - translation between server responses and domain-level carriers
//!
//! It holds no consultation logic: which resources are built, how they reference each
//! other, and in what order they are submitted is decided by `consult-core`.

pub mod allergy_intolerance;
pub mod bundle;
pub mod condition;
pub mod datatypes;
pub mod encounter;
pub mod medication_request;
pub mod service_request;

// Re-export facades
pub use bundle::{OperationOutcome, TransactionBundle};

// Re-export public domain-level types
pub use allergy_intolerance::{AllergyCategory, AllergyIntolerance, AllergyReaction, ReactionSeverity};
pub use bundle::{
    AcknowledgedBundle, AcknowledgedEntry, Bundle, BundleEntry, BundleRequest, BundleType,
    HttpVerb, Resource, ResourceLocation,
};
pub use condition::{Condition, ConditionCategory, VerificationStatus};
pub use datatypes::{Annotation, CodeableConcept, Coding, Period, Quantity, Reference};
pub use encounter::{Encounter, EncounterLocation, EncounterParticipant, EncounterStatus};
pub use medication_request::{DispenseRequest, DoseAndRate, Dosage, MedicationRequest, Timing, TimingRepeat};
pub use service_request::{RequestIntent, RequestPriority, RequestStatus, ServiceRequest};

// Re-export the token type from the consult_uuid crate
pub use consult_uuid::UrnUuid;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
