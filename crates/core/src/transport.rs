//! Submission transport.
//!
//! A submission is exactly one request/response: the whole transaction bundle goes to the
//! FHIR server base URL and the server either commits every entry or none.

use async_trait::async_trait;
use fhir::{AcknowledgedBundle, Bundle, OperationOutcome, TransactionBundle};

use crate::config::CoreConfig;
use crate::constants::{FHIR_JSON_MEDIA_TYPE, SUBMIT_FAILED_FALLBACK};
use crate::{ConsultError, ConsultResult};

/// Sends one transaction bundle and returns the server's acknowledgement.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, bundle: &Bundle) -> ConsultResult<AcknowledgedBundle>;
}

/// Transport that POSTs transaction bundles to a FHIR server over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds the HTTP client from the startup configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConsultError::HttpClient` if the TLS backend cannot be initialised.
    pub fn new(cfg: &CoreConfig) -> ConsultResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .build()
            .map_err(ConsultError::HttpClient)?;

        Ok(Self {
            client,
            base_url: cfg.fhir_base_url().to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SubmissionTransport for HttpTransport {
    async fn submit(&self, bundle: &Bundle) -> ConsultResult<AcknowledgedBundle> {
        let body = TransactionBundle::render(bundle)?;
        tracing::debug!(url = %self.base_url, entries = bundle.entry.len(), "posting transaction bundle");

        let response = self
            .client
            .post(&self.base_url)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON_MEDIA_TYPE)
            .header(reqwest::header::ACCEPT, FHIR_JSON_MEDIA_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        interpret_response(status.as_u16(), status.is_success(), &text)
    }
}

/// Turns a raw HTTP status and body into an acknowledgement or a rejection.
pub fn interpret_response(status: u16, success: bool, body: &str) -> ConsultResult<AcknowledgedBundle> {
    if success {
        return Ok(TransactionBundle::parse_response(body)?);
    }
    Err(rejection(status, body))
}

/// Builds the rejection error for a non-success response, preferring the server's
/// OperationOutcome diagnostics over the generic message.
pub fn rejection(status: u16, body: &str) -> ConsultError {
    let message = OperationOutcome::message(body).unwrap_or_else(|| SUBMIT_FAILED_FALLBACK.to_owned());
    ConsultError::Rejected { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn success_body_is_parsed_into_locations() {
        let body = r#"{
            "resourceType": "Bundle",
            "type": "transaction-response",
            "entry": [
                {"response": {"status": "201 Created", "location": "Encounter/enc-1/_history/1"}},
                {"response": {"status": "201 Created", "location": "Condition/c-1/_history/1"}}
            ]
        }"#;
        let ack = interpret_response(200, true, body).expect("parsed");
        assert_eq!(ack.first_id_of("Encounter"), Some("enc-1"));
        assert_eq!(ack.assigned().count(), 2);
    }

    #[test]
    fn rejection_uses_operation_outcome_diagnostics() {
        let body = r#"{
            "resourceType": "OperationOutcome",
            "issue": [{"severity": "error", "code": "invalid", "diagnostics": "Patient not found"}]
        }"#;
        let err = interpret_response(422, false, body).expect_err("rejected");
        assert!(matches!(
            err,
            ConsultError::Rejected { status: 422, ref message } if message == "Patient not found"
        ));
    }

    #[test]
    fn rejection_without_outcome_falls_back() {
        let err = rejection(502, "<html>bad gateway</html>");
        assert!(matches!(
            err,
            ConsultError::Rejected { status: 502, ref message } if message == SUBMIT_FAILED_FALLBACK
        ));
    }

    #[test]
    fn malformed_success_body_is_an_error() {
        let err = interpret_response(200, true, "not json").expect_err("malformed");
        assert!(matches!(err, ConsultError::Fhir(_)));
    }

    const ACK: &str = r#"{"resourceType":"Bundle","type":"transaction-response","entry":[{"response":{"status":"201 Created","location":"Encounter/enc-9/_history/1"}}]}"#;

    /// Reads one request (headers plus `Content-Length` body) from the stream.
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        use tokio::io::AsyncReadExt;

        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    #[tokio::test]
    async fn slow_commit_is_not_cut_off_by_the_connect_timeout() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_millis(600)).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/fhir+json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                ACK.len(),
                ACK
            );
            stream.write_all(response.as_bytes()).await.expect("write");
            request
        });

        let cfg = CoreConfig::new(&format!("http://{addr}/fhir"), Duration::from_millis(200), false)
            .expect("config");
        let transport = HttpTransport::new(&cfg).expect("client");
        let bundle = Bundle::transaction(None);

        let ack = transport.submit(&bundle).await.expect("slow server still acknowledged");
        assert_eq!(ack.first_id_of("Encounter"), Some("enc-9"));

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /fhir "), "{request}");
        assert!(request.to_ascii_lowercase().contains("content-type: application/fhir+json"));
    }

    #[test]
    fn transport_keeps_configured_base_url() {
        let cfg = CoreConfig::new("https://hie.example.org/fhir/", Duration::from_secs(5), false)
            .expect("config");
        let transport = HttpTransport::new(&cfg).expect("client");
        assert_eq!(transport.base_url(), "https://hie.example.org/fhir");
    }
}
