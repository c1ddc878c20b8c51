//! URN-style reference tokens.
//!
//! A FHIR transaction bundle can carry resources that do not have a server-assigned
//! identifier yet. Entries refer to each other through a temporary `fullUrl` of the form
//! `urn:uuid:<uuid>`; the server rewrites those references when it commits the bundle.
//!
//! This crate provides [`UrnUuid`], a wrapper that *guarantees* the canonical token form
//! once constructed:
//! - Prefix: `urn:uuid:`
//! - Body: lowercase, hyphenated RFC 4122 UUID (36 characters)
//! - Example: `urn:uuid:550e8400-e29b-41d4-a716-446655440000`
//!
//! Tokens are only meaningful inside the bundle that declares them. A fresh token is
//! generated for every new resource in every submission and is never reused.

mod token;

// Re-export public types
pub use token::{Uuid, UrnUuid, URN_UUID_PREFIX};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
