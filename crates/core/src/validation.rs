//! Input validation utilities.
//!
//! This module contains functions for validating configuration inputs before they are
//! used to reach external systems.

use crate::{ConsultError, ConsultResult};

/// Validates a FHIR server base URL and returns it without a trailing slash.
///
/// The base URL is the target of every transaction submission, so it is checked once at
/// startup:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Requires an absolute `http` or `https` URL with a host
/// - Rejects query strings and fragments, which cannot be part of a FHIR base
///
/// # Errors
///
/// Returns a `ConsultError::InvalidConfig` if the URL is invalid.
pub fn validate_fhir_base_url(raw: &str) -> ConsultResult<String> {
    const MAX_URL_LEN: usize = 2048;

    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConsultError::InvalidConfig(
            "FHIR base URL cannot be empty".into(),
        ));
    }

    if trimmed.len() > MAX_URL_LEN {
        return Err(ConsultError::InvalidConfig(format!(
            "FHIR base URL exceeds maximum length of {} characters",
            MAX_URL_LEN
        )));
    }

    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConsultError::InvalidConfig(format!("invalid FHIR base URL '{trimmed}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConsultError::InvalidConfig(format!(
            "FHIR base URL must use http or https scheme, got: {}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(ConsultError::InvalidConfig(
            "FHIR base URL must include a host".into(),
        ));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConsultError::InvalidConfig(
            "FHIR base URL must not contain a query or fragment".into(),
        ));
    }

    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_and_strips_trailing_slash() {
        assert_eq!(
            validate_fhir_base_url("https://hie.example.org/fhir/").unwrap(),
            "https://hie.example.org/fhir"
        );
        assert_eq!(
            validate_fhir_base_url(" http://localhost:8080/fhir ").unwrap(),
            "http://localhost:8080/fhir"
        );
    }

    #[test]
    fn rejects_blank_and_non_http() {
        assert!(matches!(
            validate_fhir_base_url("   "),
            Err(ConsultError::InvalidConfig(_))
        ));
        assert!(matches!(
            validate_fhir_base_url("ftp://example.org/fhir"),
            Err(ConsultError::InvalidConfig(msg)) if msg.contains("ftp")
        ));
        assert!(validate_fhir_base_url("not a url").is_err());
    }

    #[test]
    fn rejects_query_and_fragment() {
        assert!(validate_fhir_base_url("https://example.org/fhir?x=1").is_err());
        assert!(validate_fhir_base_url("https://example.org/fhir#frag").is_err());
    }
}
