//! Spreadsheet-backed time source.
//!
//! Reads a fixed tabular range from the Google Sheets values endpoint.
//! Columns are `[employee email, start, end, date]`; the first row is a
//! header. The trailing date column is informational and ignored.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::parse_timestamp;
use crate::adapters::traits::TimeSource;
use crate::error::SourceError;
use crate::ledger::models::{NativeSpan, SourceKind, SourceRecord};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_RANGE: &str = "Sheet1!A:D";

/// Source details blob stored alongside a spreadsheet source.
#[derive(Debug, Deserialize)]
struct SheetDetails {
    #[serde(rename = "spreadsheetId")]
    spreadsheet_id: String,
    range: Option<String>,
}

/// Values-endpoint response shape.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsTimeSource {
    client: Client,
    base_url: String,
}

impl SheetsTimeSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Base URL override for tests and API-compatible proxies.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn fetch_rows(
        &self,
        credential: &str,
        details: &serde_json::Value,
    ) -> Result<Vec<Vec<String>>, SourceError> {
        let details: SheetDetails = serde_json::from_value(details.clone())
            .map_err(|e| SourceError::MalformedPayload(format!("source details: {e}")))?;
        let range = details.range.as_deref().unwrap_or(DEFAULT_RANGE);

        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, details.spreadsheet_id, range
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::CredentialInvalid(format!(
                "sheets API returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(SourceError::Unreachable(format!(
                "sheets API returned {status}"
            )));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedPayload(e.to_string()))?;

        Ok(body.values)
    }
}

impl Default for SheetsTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one data row. `None` means the row is missing a field or carries
/// an unparseable timestamp and must be skipped.
fn parse_row(row: &[String]) -> Option<NativeSpan> {
    let email = row.first()?.trim();
    if email.is_empty() {
        return None;
    }
    let started_at = parse_timestamp(row.get(1)?)?;
    let ended_at = parse_timestamp(row.get(2)?)?;

    Some(NativeSpan {
        native_subject_id: email.to_string(),
        started_at,
        ended_at,
    })
}

/// Normalize fetched rows, skipping the header row and warning on rows
/// that do not parse.
fn collect_spans(source_id: Uuid, rows: &[Vec<String>]) -> Vec<NativeSpan> {
    let mut spans = Vec::new();

    for (index, row) in rows.iter().enumerate().skip(1) {
        match parse_row(row) {
            Some(span) => spans.push(span),
            None => warn!(
                source_id = %source_id,
                row = index + 1,
                "skipping sheet row with missing or unparseable fields"
            ),
        }
    }

    spans
}

#[async_trait]
impl TimeSource for SheetsTimeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::GoogleSheets
    }

    async fn fetch_spans(&self, source: &SourceRecord) -> Result<Vec<NativeSpan>, SourceError> {
        let rows = self.fetch_rows(&source.credential, &source.details).await?;
        Ok(collect_spans(source.id, &rows))
    }

    async fn verify(
        &self,
        credential: &str,
        details: &serde_json::Value,
    ) -> Result<(), SourceError> {
        self.fetch_rows(credential, details).await.map(|_| ())
    }
}
