//! FHIR transaction bundle wire models and translation helpers.
//!
//! Responsibilities:
//! - Define the outgoing transaction [`Bundle`] and its typed entries
//! - Render a bundle as FHIR JSON
//! - Parse the server's `transaction-response` into domain-level [`AcknowledgedBundle`]
//! - Extract a human-readable message from an `OperationOutcome` error body
//!
//! Notes:
//! - The outgoing model is strict and typed; every entry carries one of the consultation
//!   resource kinds in [`Resource`].
//! - The response model is lenient: servers echo resources and add elements we do not
//!   read, so unknown keys are ignored there.

use crate::allergy_intolerance::AllergyIntolerance;
use crate::condition::Condition;
use crate::datatypes::Reference;
use crate::encounter::Encounter;
use crate::medication_request::MedicationRequest;
use crate::service_request::ServiceRequest;
use crate::{FhirError, FhirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Transaction request verb for a bundle entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    /// Create a new resource.
    Post,
    /// Amend an existing resource.
    Put,
}

/// Type of a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    Collection,
}

/// Any resource that can appear in a consultation bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Encounter(Encounter),
    Condition(Condition),
    AllergyIntolerance(AllergyIntolerance),
    ServiceRequest(ServiceRequest),
    MedicationRequest(MedicationRequest),
}

impl Resource {
    /// FHIR resource type name, as used in request URLs.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Encounter(_) => "Encounter",
            Resource::Condition(_) => "Condition",
            Resource::AllergyIntolerance(_) => "AllergyIntolerance",
            Resource::ServiceRequest(_) => "ServiceRequest",
            Resource::MedicationRequest(_) => "MedicationRequest",
        }
    }

    /// The reference this resource uses to point at its parent encounter.
    ///
    /// Returns `None` for the encounter itself.
    pub fn encounter_reference(&self) -> Option<&Reference> {
        match self {
            Resource::Encounter(_) => None,
            Resource::Condition(r) => Some(&r.encounter),
            Resource::AllergyIntolerance(r) => Some(&r.encounter),
            Resource::ServiceRequest(r) => Some(&r.encounter),
            Resource::MedicationRequest(r) => Some(&r.encounter),
        }
    }
}

/// The `request` element of a transaction entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRequest {
    pub method: HttpVerb,
    pub url: String,
}

/// One entry of a transaction bundle: the resource, its verb, and its reference token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// Reference token other entries use to point at this one.
    pub full_url: String,

    pub resource: Resource,

    pub request: BundleRequest,
}

impl BundleEntry {
    /// Entry that creates `resource` under the bundle-local token `full_url`.
    pub fn create(full_url: impl Into<String>, resource: Resource) -> Self {
        let url = resource.resource_type().to_owned();
        Self {
            full_url: full_url.into(),
            resource,
            request: BundleRequest {
                method: HttpVerb::Post,
                url,
            },
        }
    }

    /// Entry that amends the resource addressed by `reference` (`Encounter/123`).
    pub fn amend(reference: impl Into<String>, resource: Resource) -> Self {
        let reference = reference.into();
        Self {
            full_url: reference.clone(),
            resource,
            request: BundleRequest {
                method: HttpVerb::Put,
                url: reference,
            },
        }
    }

    pub fn verb(&self) -> HttpVerb {
        self.request.method
    }
}

/// An ordered collection of entries submitted as one atomic unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "camelCase")]
pub struct Bundle {
    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// An empty transaction bundle.
    pub fn transaction(timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            bundle_type: BundleType::Transaction,
            timestamp,
            entry: Vec::new(),
        }
    }
}

/// Location of a resource the server created or updated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLocation {
    pub resource_type: String,
    pub id: String,
    pub version: Option<String>,
}

impl ResourceLocation {
    /// Parses `Type/id`, `Type/id/_history/v`, or an absolute URL ending in either.
    pub fn parse(location: &str) -> FhirResult<Self> {
        let trimmed = location.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        let (type_idx, version) = match segments.iter().rposition(|s| *s == "_history") {
            Some(pos) => {
                let version = segments.get(pos + 1).map(|v| (*v).to_owned());
                (pos.checked_sub(2), version)
            }
            None => (segments.len().checked_sub(2), None),
        };

        let idx = type_idx.ok_or_else(|| {
            FhirError::Translation(format!("Unrecognised resource location: {location}"))
        })?;
        let resource_type = segments[idx];
        let id = segments[idx + 1];

        let looks_like_type = resource_type
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase());
        if !looks_like_type {
            return Err(FhirError::Translation(format!(
                "Unrecognised resource location: {location}"
            )));
        }

        Ok(Self {
            resource_type: resource_type.to_owned(),
            id: id.to_owned(),
            version,
        })
    }
}

/// Domain-level outcome of one acknowledged entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcknowledgedEntry {
    /// HTTP status line reported for the entry (e.g. `201 Created`).
    pub status: String,
    pub location: Option<ResourceLocation>,
}

/// Domain-level carrier for a server's transaction response.
///
/// Entries appear in the same order as the submitted bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AcknowledgedBundle {
    pub entries: Vec<AcknowledgedEntry>,
}

impl AcknowledgedBundle {
    /// Server-assigned locations, in submission order, skipping entries without one.
    pub fn assigned(&self) -> impl Iterator<Item = &ResourceLocation> {
        self.entries.iter().filter_map(|e| e.location.as_ref())
    }

    /// The identifier assigned to the first resource of the given type.
    pub fn first_id_of(&self, resource_type: &str) -> Option<&str> {
        self.assigned()
            .find(|l| l.resource_type == resource_type)
            .map(|l| l.id.as_str())
    }
}

// ============================================================================
// Public TransactionBundle operations
// ============================================================================

/// Transaction bundle operations.
///
/// This is a zero-sized type used for namespacing bundle-related operations.
pub struct TransactionBundle;

impl TransactionBundle {
    /// Render a bundle as compact FHIR JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render(bundle: &Bundle) -> FhirResult<String> {
        serde_json::to_string(bundle)
            .map_err(|e| FhirError::Translation(format!("Failed to serialize bundle: {e}")))
    }

    /// Render a bundle as indented FHIR JSON, for display.
    pub fn render_pretty(bundle: &Bundle) -> FhirResult<String> {
        serde_json::to_string_pretty(bundle)
            .map_err(|e| FhirError::Translation(format!("Failed to serialize bundle: {e}")))
    }

    /// Parse a server `transaction-response` body.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `entry[1].response.status`)
    /// to the failing field when the body does not match the response schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the body is not a `Bundle` of type `transaction-response`,
    /// - any entry lacks a `response.status`,
    /// - a `response.location` cannot be interpreted as a resource location.
    pub fn parse_response(json_text: &str) -> FhirResult<AcknowledgedBundle> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire = match serde_path_to_error::deserialize::<_, ResponseBundleWire>(&mut deserializer)
        {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Transaction response schema mismatch at {path}: {source}"
                )));
            }
        };

        response_to_domain(wire)
    }
}

/// OperationOutcome helpers.
pub struct OperationOutcome;

impl OperationOutcome {
    /// Extracts a readable message from an `OperationOutcome` body.
    ///
    /// Joins each issue's `diagnostics` (or `details.text`) with `"; "`. Returns `None` when
    /// the body is not an OperationOutcome or carries no readable issue text.
    pub fn message(json_text: &str) -> Option<String> {
        let wire: OperationOutcomeWire = serde_json::from_str(json_text).ok()?;
        if wire.resource_type != "OperationOutcome" {
            return None;
        }
        let messages: Vec<String> = wire
            .issue
            .into_iter()
            .filter_map(|i| i.diagnostics.or(i.details.and_then(|d| d.text)))
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .collect();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBundleWire {
    resource_type: String,
    #[serde(rename = "type")]
    bundle_type: BundleType,
    #[serde(default)]
    entry: Vec<ResponseEntryWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseEntryWire {
    response: ResponseWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseWire {
    status: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationOutcomeWire {
    resource_type: String,
    #[serde(default)]
    issue: Vec<IssueWire>,
}

#[derive(Debug, Deserialize)]
struct IssueWire {
    #[serde(default)]
    diagnostics: Option<String>,
    #[serde(default)]
    details: Option<IssueDetailsWire>,
}

#[derive(Debug, Deserialize)]
struct IssueDetailsWire {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn response_to_domain(wire: ResponseBundleWire) -> FhirResult<AcknowledgedBundle> {
    if wire.resource_type != "Bundle" {
        return Err(FhirError::Translation(format!(
            "Expected a Bundle response, got {}",
            wire.resource_type
        )));
    }
    if wire.bundle_type != BundleType::TransactionResponse {
        return Err(FhirError::Translation(format!(
            "Expected a transaction-response bundle, got {:?}",
            wire.bundle_type
        )));
    }

    let entries = wire
        .entry
        .into_iter()
        .map(|e| {
            let location = e
                .response
                .location
                .as_deref()
                .map(ResourceLocation::parse)
                .transpose()?;
            Ok(AcknowledgedEntry {
                status: e.response.status,
                location,
            })
        })
        .collect::<FhirResult<Vec<_>>>()?;

    Ok(AcknowledgedBundle { entries })
}
