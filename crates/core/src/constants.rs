//! Constants used throughout the consultation core crate.

use std::time::Duration;

/// Environment variable holding the FHIR server base URL.
pub const FHIR_BASE_URL_ENV: &str = "CONSULT_FHIR_BASE_URL";

/// Environment variable holding the connect timeout in whole seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "CONSULT_CONNECT_TIMEOUT_SECS";

/// Environment variable toggling the audit sink.
pub const AUDIT_ENABLED_ENV: &str = "CONSULT_AUDIT_ENABLED";

/// Default FHIR endpoint used when no base URL is configured.
pub const DEFAULT_FHIR_BASE_URL: &str = "http://localhost:8080/fhir";

/// Default HTTP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Media type for FHIR JSON payloads.
pub const FHIR_JSON_MEDIA_TYPE: &str = "application/fhir+json";

/// Title and message of the one-time notification fired after a successful submission.
pub const SUBMITTED_TITLE: &str = "Success";
pub const SUBMITTED_MESSAGE: &str = "Consultation submitted successfully";

/// Title and fallback message of the failure notification.
pub const SUBMIT_FAILED_TITLE: &str = "Error";
pub const SUBMIT_FAILED_FALLBACK: &str = "Error submitting consultation";

/// Name of the frequency that dispenses a single dose immediately.
pub const IMMEDIATE_FREQUENCY_NAME: &str = "Immediately";

/// Concept identifier assigned to the immediate frequency when an order is flagged stat.
pub const IMMEDIATE_FREQUENCY_CONCEPT: &str = "immediately";

/// Standard dosing frequencies and their doses per day.
pub const STANDARD_FREQUENCIES: &[(&str, f64)] = &[
    ("Once a day", 1.0),
    ("Twice a day", 2.0),
    ("Thrice a day", 3.0),
    ("Four times a day", 4.0),
    ("Every Hour", 24.0),
    ("Every 2 hours", 12.0),
    ("Every 3 hours", 8.0),
    ("Every 4 hours", 6.0),
    ("Every 6 hours", 4.0),
    ("Every 8 hours", 3.0),
    ("Every 12 hours", 2.0),
    ("On alternate days", 1.0 / 2.0),
    ("Once a week", 1.0 / 7.0),
    ("Twice a week", 2.0 / 7.0),
    ("Thrice a week", 3.0 / 7.0),
    ("Every 2 weeks", 1.0 / 14.0),
    ("Every 3 weeks", 1.0 / 21.0),
    ("Once a month", 1.0 / 30.0),
];
