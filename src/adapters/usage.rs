//! HTTP usage-tracking time source.
//!
//! The stored credential is a JSON blob naming the polling endpoint and
//! the bearer key. One GET returns every tracked employee with their
//! session intervals grouped under the employee's email.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::parse_timestamp;
use crate::adapters::traits::TimeSource;
use crate::error::SourceError;
use crate::ledger::models::{NativeSpan, SourceKind, SourceRecord};

/// Credential blob stored alongside a usage-tracking source.
#[derive(Debug, Deserialize)]
struct UsageCredential {
    endpoint: String,
    #[serde(rename = "apiKey")]
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct EmployeeUsage {
    #[serde(rename = "employeeEmail")]
    employee_email: String,
    #[serde(default)]
    sessions: Vec<UsageSession>,
}

#[derive(Debug, Deserialize)]
struct UsageSession {
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "endTime")]
    end_time: String,
}

pub struct UsageApiTimeSource {
    client: Client,
}

impl UsageApiTimeSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn fetch_payload(&self, credential: &str) -> Result<Vec<EmployeeUsage>, SourceError> {
        let credential: UsageCredential = serde_json::from_str(credential)
            .map_err(|e| SourceError::CredentialInvalid(format!("usage credential blob: {e}")))?;

        let response = self
            .client
            .get(&credential.endpoint)
            .bearer_auth(&credential.api_key)
            .send()
            .await
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::CredentialInvalid(format!(
                "usage API returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(SourceError::Unreachable(format!(
                "usage API returned {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::MalformedPayload(e.to_string()))
    }
}

impl Default for UsageApiTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten the grouped payload into canonical spans, warning on sessions
/// that do not parse.
fn collect_spans(source_id: Uuid, payload: &[EmployeeUsage]) -> Vec<NativeSpan> {
    let mut spans = Vec::new();

    for employee in payload {
        for session in &employee.sessions {
            let parsed = parse_timestamp(&session.start_time)
                .zip(parse_timestamp(&session.end_time));
            let Some((started_at, ended_at)) = parsed else {
                warn!(
                    source_id = %source_id,
                    native_subject = %employee.employee_email,
                    "skipping usage session with unparseable timestamps"
                );
                continue;
            };

            spans.push(NativeSpan {
                native_subject_id: employee.employee_email.clone(),
                started_at,
                ended_at,
            });
        }
    }

    spans
}

#[async_trait]
impl TimeSource for UsageApiTimeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::UsageApi
    }

    async fn fetch_spans(&self, source: &SourceRecord) -> Result<Vec<NativeSpan>, SourceError> {
        let payload = self.fetch_payload(&source.credential).await?;
        Ok(collect_spans(source.id, &payload))
    }

    async fn verify(
        &self,
        credential: &str,
        _details: &serde_json::Value,
    ) -> Result<(), SourceError> {
        self.fetch_payload(credential).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn flattens_grouped_sessions() {
        let payload: Vec<EmployeeUsage> = serde_json::from_value(serde_json::json!([
            {
                "employeeEmail": "a@x.com",
                "sessions": [
                    {"startTime": "2024-01-01T08:00:00Z", "endTime": "2024-01-01T12:00:00Z"},
                    {"startTime": "2024-01-02T08:00:00Z", "endTime": "2024-01-02T10:30:00Z"}
                ]
            },
            {
                "employeeEmail": "b@x.com",
                "sessions": [
                    {"startTime": "2024-01-01T09:00:00Z", "endTime": "2024-01-01T17:00:00Z"}
                ]
            }
        ]))
        .unwrap();

        let spans = collect_spans(Uuid::new_v4(), &payload);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].native_subject_id, "a@x.com");
        assert_eq!(
            spans[2].started_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn skips_unparseable_sessions_only() {
        let payload: Vec<EmployeeUsage> = serde_json::from_value(serde_json::json!([
            {
                "employeeEmail": "a@x.com",
                "sessions": [
                    {"startTime": "bogus", "endTime": "2024-01-01T12:00:00Z"},
                    {"startTime": "2024-01-01T08:00:00Z", "endTime": "2024-01-01T12:00:00Z"}
                ]
            }
        ]))
        .unwrap();

        let spans = collect_spans(Uuid::new_v4(), &payload);
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn employee_without_sessions_yields_nothing() {
        let payload: Vec<EmployeeUsage> =
            serde_json::from_value(serde_json::json!([{ "employeeEmail": "a@x.com" }])).unwrap();

        assert!(collect_spans(Uuid::new_v4(), &payload).is_empty());
    }

    #[test]
    fn credential_blob_must_name_endpoint_and_key() {
        let parsed: Result<UsageCredential, _> =
            serde_json::from_str(r#"{"endpoint": "https://t.example/api"}"#);
        assert!(parsed.is_err());

        let parsed: UsageCredential = serde_json::from_str(
            r#"{"endpoint": "https://t.example/api", "apiKey": "secret"}"#,
        )
        .unwrap();
        assert_eq!(parsed.endpoint, "https://t.example/api");
        assert_eq!(parsed.api_key, "secret");
    }
}
