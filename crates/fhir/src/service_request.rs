//! FHIR R4 `ServiceRequest` wire model (investigation orders).

use crate::datatypes::{CodeableConcept, Reference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request status; consultation orders are always `active` when placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Draft,
    Active,
    Revoked,
    Completed,
}

/// Request intent; consultation orders are always `order`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestIntent {
    Proposal,
    Plan,
    Order,
}

/// Urgency of a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    #[default]
    Routine,
    Urgent,
    Asap,
    Stat,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub status: RequestStatus,

    pub intent: RequestIntent,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    pub priority: RequestPriority,

    pub code: CodeableConcept,

    pub subject: Reference,

    pub encounter: Reference,

    pub authored_on: DateTime<Utc>,

    pub requester: Reference,
}
