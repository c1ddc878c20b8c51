//! # Consult Core
//!
//! Core logic for composing and submitting a clinical consultation.
//!
//! A consultation is recorded as one encounter plus the clinical facts captured during it
//! (diagnoses, allergies, conditions, investigation orders and medication orders). This
//! crate holds:
//! - the encounter session and the per-category selection stores with their validators
//! - reference resolution for the encounter the facts link to
//! - the fact entry mappers and the bundle assembler
//! - the submission orchestrator and its HTTP transport
//! - startup configuration and consultation draft loading
//!
//! **No wire concerns**: FHIR JSON models live in the `fhir` crate; command-line handling
//! lives in `consult-cli`.

pub mod assembler;
pub mod config;
pub mod constants;
pub mod draft;
pub mod encounter;
pub mod error;
pub mod mappers;
pub mod quantity;
pub mod reference;
pub mod sinks;
pub mod stores;
pub mod submission;
pub mod transport;
pub mod validation;

pub use assembler::{assemble, compose, compose_for, ComposedBundle, FactEntries};
pub use config::CoreConfig;
pub use draft::ConsultationDraft;
pub use encounter::{CompleteEncounter, EncounterContext, EncounterSession, MissingField};
pub use error::{ConsultError, ConsultResult};
pub use mappers::MappingContext;
pub use quantity::{total_quantity, DurationUnit, Frequency};
pub use reference::{resolve_encounter_reference, EncounterReference, SubmissionVerb};
pub use sinks::{
    AuditError, AuditEventType, AuditSink, NoopAuditSink, NotificationKind, NotificationSink,
    TracingAuditSink, TracingNotifier,
};
pub use stores::{CategoryStore, ConsultationStores, FactCategory, FieldError, SharedStore, Validate};
pub use submission::{
    CancelOutcome, ConsultationSubmitter, IgnoreReason, SubmissionReceipt, SubmissionState,
    SubmitOutcome,
};
pub use transport::{HttpTransport, SubmissionTransport};
