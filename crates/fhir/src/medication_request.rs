//! FHIR R4 `MedicationRequest` wire model (medication orders).

use crate::datatypes::{CodeableConcept, Period, Quantity, Reference};
use crate::service_request::{RequestIntent, RequestPriority, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub status: RequestStatus,

    pub intent: RequestIntent,

    pub priority: RequestPriority,

    pub medication_reference: Reference,

    pub subject: Reference,

    pub encounter: Reference,

    pub authored_on: DateTime<Utc>,

    pub requester: Reference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage_instruction: Vec<Dosage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispense_request: Option<DispenseRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_instruction: Option<String>,

    pub timing: Timing,

    pub as_needed_boolean: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dose_and_rate: Vec<DoseAndRate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    /// Frequency concept ("Twice a day", "Immediately", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<TimingRepeat>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRepeat {
    pub duration: f64,

    /// UCUM unit code: `min`, `h`, `d`, `wk`, `mo` or `a`.
    pub duration_unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseAndRate {
    pub dose_quantity: Quantity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    pub quantity: Quantity,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_period: Option<Period>,
}
