//! Notification and audit sinks.
//!
//! Both are one-way sends. The submitter never waits on them and their failures never
//! change the outcome of a submission.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Receives user-facing notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str, kind: NotificationKind);
}

/// Audit event recorded once per successful submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    CreateEncounter,
    EditEncounter,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::CreateEncounter => "CREATE_ENCOUNTER",
            AuditEventType::EditEncounter => "EDIT_ENCOUNTER",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives audit events.
pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        event_type: AuditEventType,
        patient_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<(), AuditError>;
}

/// Writes notifications to the tracing subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, title: &str, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Success => tracing::info!(title, message, "notification"),
            NotificationKind::Error => tracing::error!(title, message, "notification"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditRecord<'a> {
    event_type: AuditEventType,
    patient_id: &'a str,
    params: &'a BTreeMap<String, String>,
}

/// Writes audit events as structured tracing records under the `audit` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(
        &self,
        event_type: AuditEventType,
        patient_id: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<(), AuditError> {
        let record = serde_json::to_string(&AuditRecord {
            event_type,
            patient_id,
            params,
        })?;
        tracing::info!(target: "audit", event = %event_type, %record, "audit event");
        Ok(())
    }
}

/// Discards audit events. Used when auditing is disabled in configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(
        &self,
        _event_type: AuditEventType,
        _patient_id: &str,
        _params: &BTreeMap<String, String>,
    ) -> Result<(), AuditError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_use_audit_codes() {
        assert_eq!(AuditEventType::CreateEncounter.to_string(), "CREATE_ENCOUNTER");
        assert_eq!(
            serde_json::to_string(&AuditEventType::EditEncounter).expect("json"),
            "\"EDIT_ENCOUNTER\""
        );
    }

    #[test]
    fn tracing_sink_accepts_events() {
        let mut params = BTreeMap::new();
        params.insert("encounterUuid".to_owned(), "enc-1".to_owned());
        assert!(TracingAuditSink
            .record(AuditEventType::CreateEncounter, "patient-1", &params)
            .is_ok());
        assert!(NoopAuditSink
            .record(AuditEventType::EditEncounter, "patient-1", &params)
            .is_ok());
    }
}
