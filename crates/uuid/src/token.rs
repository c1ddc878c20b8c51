//! Implementation of the `urn:uuid` token wrapper.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Prefix shared by every token.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// A bundle-local reference token in canonical `urn:uuid:` form.
///
/// # Construction
/// - [`UrnUuid::new`] generates a fresh random (v4) token.
/// - [`UrnUuid::parse`] validates an externally supplied token.
/// - [`UrnUuid::from_uuid`] wraps an existing UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UrnUuid(Uuid);

impl Default for UrnUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl UrnUuid {
    /// Generates a new token backed by a random v4 UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Validates and parses a token that must already be canonical.
    ///
    /// Uppercase, unhyphenated, and braced UUID bodies are rejected, so that two
    /// textual tokens compare equal exactly when they denote the same resource.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "token must be 'urn:uuid:' followed by a lowercase hyphenated UUID, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(&input[URN_UUID_PREFIX.len()..])
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid UUID in token '{input}': {e}")))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is a canonical `urn:uuid:` token.
    ///
    /// This is a purely syntactic check: prefix, length, and lowercase hex digits with
    /// hyphens at positions 8, 13, 18 and 23 of the UUID body.
    pub fn is_canonical(input: &str) -> bool {
        let Some(body) = input.strip_prefix(URN_UUID_PREFIX) else {
            return false;
        };
        body.len() == 36
            && body.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }
}

impl fmt::Display for UrnUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URN_UUID_PREFIX, self.0.hyphenated())
    }
}

impl FromStr for UrnUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UrnUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UrnUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UrnUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UrnUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}
