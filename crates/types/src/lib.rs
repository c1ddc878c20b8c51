//! Validated text primitives shared by the consultation crates.
//!
//! Selections arrive from UI state and draft files as loose strings. These wrappers are
//! the point where that text is checked once, so mappers and wire models can rely on it.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is not usable as an identifier segment
    #[error("invalid identifier '{0}': only ASCII without whitespace or '/' is allowed")]
    InvalidIdentifier(String),

    /// The input exceeds the maximum identifier length
    #[error("identifier exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a terminology concept, drug, or server resource.
///
/// Concept identifiers are embedded verbatim into FHIR references such as
/// `Medication/{id}` and `Patient/{id}`, so they must be a single path segment:
/// ASCII, no whitespace, no `/`, at most [`ConceptId::MAX_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConceptId(String);

impl ConceptId {
    /// Upper bound on identifier length.
    pub const MAX_LEN: usize = 255;

    /// Validates and wraps an identifier. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`TextError`] if the identifier is empty, too long, or contains characters
    /// that cannot appear in a reference path segment.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(TextError::TooLong { max: Self::MAX_LEN });
        }
        let ok = trimmed
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b'/');
        if !ok {
            return Err(TextError::InvalidIdentifier(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats a FHIR literal reference (`{resource_type}/{id}`).
    pub fn reference(&self, resource_type: &str) -> String {
        format!("{}/{}", resource_type, self.0)
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConceptId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ConceptId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConceptId::new(s)
    }
}

impl serde::Serialize for ConceptId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ConceptId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ConceptId::new(&s).map_err(serde::de::Error::custom)
    }
}
