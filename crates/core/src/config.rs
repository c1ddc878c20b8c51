//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during a submission, which can lead to inconsistent behaviour in test harnesses.

use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_FHIR_BASE_URL};
use crate::validation::validate_fhir_base_url;
use crate::{ConsultError, ConsultResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    fhir_base_url: String,
    connect_timeout: Duration,
    audit_enabled: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ConsultError::InvalidConfig` if the base URL is not a usable http(s) URL or
    /// the timeout is zero.
    pub fn new(
        fhir_base_url: &str,
        connect_timeout: Duration,
        audit_enabled: bool,
    ) -> ConsultResult<Self> {
        let fhir_base_url = validate_fhir_base_url(fhir_base_url)?;

        if connect_timeout.is_zero() {
            return Err(ConsultError::InvalidConfig(
                "connect timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            fhir_base_url,
            connect_timeout,
            audit_enabled,
        })
    }

    /// Build a configuration from raw environment values.
    ///
    /// Each argument is the value of the corresponding environment variable, if set. The
    /// caller reads the environment; this function only interprets the values.
    pub fn from_env_values(
        base_url: Option<String>,
        timeout_secs: Option<String>,
        audit_enabled: Option<String>,
    ) -> ConsultResult<Self> {
        let base_url = base_url
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_FHIR_BASE_URL.to_string());
        let timeout = timeout_from_env_value(timeout_secs)?;
        let audit = flag_from_env_value(audit_enabled, true)?;
        Self::new(&base_url, timeout, audit)
    }

    /// Base URL of the FHIR server, without a trailing slash.
    pub fn fhir_base_url(&self) -> &str {
        &self.fhir_base_url
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn audit_enabled(&self) -> bool {
        self.audit_enabled
    }
}

/// Parse the connect timeout from an optional string value (whole seconds).
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_CONNECT_TIMEOUT`].
pub fn timeout_from_env_value(value: Option<String>) -> ConsultResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(DEFAULT_CONNECT_TIMEOUT);
    };

    let secs: u64 = value.parse().map_err(|_| {
        ConsultError::InvalidConfig(format!(
            "connect timeout must be a whole number of seconds, got '{value}'"
        ))
    })?;
    if secs == 0 {
        return Err(ConsultError::InvalidConfig(
            "connect timeout must be greater than zero".into(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `true/false`, `1/0`, `yes/no`, `on/off` (case-insensitive). If `value` is `None`
/// or empty/whitespace, returns `default`.
pub fn flag_from_env_value(value: Option<String>, default: bool) -> ConsultResult<bool> {
    let Some(value) = value.map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };

    match value.as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConsultError::InvalidConfig(format!(
            "expected a boolean flag, got '{other}'"
        ))),
    }
}
