//! FHIR R4 general-purpose datatypes used by the consultation resources.
//!
//! Only the elements the consultation bundle actually emits are modelled. All structs
//! serialise with FHIR's camelCase element names and omit absent optional elements.

use consult_types::ConceptId;
use serde::{Deserialize, Serialize};

/// A literal reference to another resource (`Patient/123`, `urn:uuid:...`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Reference with only the literal `reference` element set.
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            display: None,
        }
    }

    /// Reference to a server resource by type and identifier (`Patient/{id}`).
    pub fn resource(resource_type: &str, id: &ConceptId) -> Self {
        Self::to(id.reference(resource_type))
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn as_str(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

/// A code defined by a terminology system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A concept that may be defined by one or more codings, plus optional text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// A concept coded only by its local identifier (no system), as the concept
    /// dictionary hands them out.
    pub fn concept(code: impl Into<String>, display: Option<String>) -> Self {
        Self {
            coding: vec![Coding {
                system: None,
                code: code.into(),
                display: display.clone(),
            }],
            text: display,
        }
    }

    /// A concept coded from a published code system.
    pub fn from_system(system: &str, code: &str, display: Option<&str>) -> Self {
        Self {
            coding: vec![Coding {
                system: Some(system.to_owned()),
                code: code.to_owned(),
                display: display.map(str::to_owned),
            }],
            text: None,
        }
    }

    /// Returns the first coding's code, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.coding.first().map(|c| c.code.as_str())
    }
}

/// A measured amount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantity {
    pub value: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    /// A quantity whose unit is free text (dose forms such as "Tablet(s)").
    pub fn with_unit(value: f64, unit: Option<String>) -> Self {
        Self {
            value,
            unit,
            system: None,
            code: None,
        }
    }
}

/// A time period defined by a start and/or end.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<chrono::DateTime<chrono::Utc>>,
}

/// A free-text note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub text: String,
}
