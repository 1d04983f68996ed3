use async_trait::async_trait;

use crate::error::SourceError;
use crate::ledger::models::{NativeSpan, SourceKind, SourceRecord};

/// Capability set shared by every external time source.
///
/// Implementations are pure translators: they authenticate with the
/// stored credential, fetch one batch of raw records, and normalize them
/// into canonical spans. No scheduling or storage knowledge lives here.
#[async_trait]
pub trait TimeSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Fetch and normalize the source's current records. Rows or sessions
    /// with missing or unparseable fields are skipped with a warning, not
    /// fatal for the fetch.
    async fn fetch_spans(&self, source: &SourceRecord) -> Result<Vec<NativeSpan>, SourceError>;

    /// Cheap credential check used at source-registration time, before a
    /// candidate credential is persisted: one real fetch attempt with the
    /// results discarded.
    async fn verify(
        &self,
        credential: &str,
        details: &serde_json::Value,
    ) -> Result<(), SourceError>;
}
