//! Sync orchestration: poll every registered source, reconcile the
//! normalized spans into the ledger, and isolate per-source failures.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::AdapterRegistry;
use crate::contract::{SourceCatalog, SubjectDirectory};
use crate::error::{AppError, AppResult, SourceError};
use crate::ledger::models::SourceRecord;
use crate::sync::reconciler::Reconciler;

/// Outcome summary of one full sync run.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<SyncFailure>,
}

#[derive(Debug)]
pub struct SyncFailure {
    pub source_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Default)]
struct SourceOutcome {
    upserted: usize,
    skipped: usize,
}

pub struct SyncOrchestrator {
    catalog: Arc<dyn SourceCatalog>,
    directory: Arc<dyn SubjectDirectory>,
    registry: Arc<AdapterRegistry>,
    reconciler: Reconciler,
    fetch_timeout: Duration,
}

impl SyncOrchestrator {
    pub fn new(
        catalog: Arc<dyn SourceCatalog>,
        directory: Arc<dyn SubjectDirectory>,
        registry: Arc<AdapterRegistry>,
        reconciler: Reconciler,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            directory,
            registry,
            reconciler,
            fetch_timeout,
        }
    }

    /// Poll every registered source once, in listing order.
    ///
    /// A failure in one source is recorded against that source and never
    /// aborts the loop; only a failure to list the sources themselves is
    /// fatal for the run.
    pub async fn run_sync_all(&self) -> AppResult<SyncSummary> {
        let sources = self.catalog.list_sources().await?;
        info!(sources = sources.len(), "starting sync run");

        let mut summary = SyncSummary::default();

        for source in &sources {
            match self.sync_source(source).await {
                Ok(outcome) => {
                    info!(
                        source_id = %source.id,
                        name = %source.name,
                        upserted = outcome.upserted,
                        skipped = outcome.skipped,
                        "source sync complete"
                    );
                    summary.succeeded.push(source.id);
                }
                Err(e) => {
                    error!(
                        source_id = %source.id,
                        name = %source.name,
                        error = %e,
                        "source sync failed; continuing with remaining sources"
                    );
                    summary.failed.push(SyncFailure {
                        source_id: source.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "sync run complete"
        );
        Ok(summary)
    }

    async fn sync_source(&self, source: &SourceRecord) -> AppResult<SourceOutcome> {
        let adapter = self.registry.get(source.kind).ok_or_else(|| {
            AppError::NotFound(format!(
                "no adapter registered for source kind {}",
                source.kind
            ))
        })?;

        // A hung external call stalls only this source: the fetch is
        // bounded and expiry counts as the source being unreachable.
        let spans = match tokio::time::timeout(self.fetch_timeout, adapter.fetch_spans(source))
            .await
        {
            Ok(fetched) => fetched?,
            Err(_) => {
                return Err(SourceError::Unreachable(format!(
                    "fetch timed out after {:?}",
                    self.fetch_timeout
                ))
                .into())
            }
        };

        let mut outcome = SourceOutcome::default();

        for span in spans {
            let Some(employee_id) = self
                .directory
                .resolve_by_native_id(&span.native_subject_id)
                .await?
            else {
                warn!(
                    source_id = %source.id,
                    native_subject = %span.native_subject_id,
                    "no employee found for native identifier; span dropped"
                );
                outcome.skipped += 1;
                continue;
            };

            match self
                .reconciler
                .reconcile(employee_id, source.id, span.started_at, span.ended_at)
                .await
            {
                Ok(_) => outcome.upserted += 1,
                Err(AppError::InvalidInterval {
                    started_at,
                    ended_at,
                }) => {
                    warn!(
                        source_id = %source.id,
                        native_subject = %span.native_subject_id,
                        %started_at,
                        %ended_at,
                        "invalid interval; span dropped"
                    );
                    outcome.skipped += 1;
                }
                // Storage failures are not span-local: fail the source.
                Err(other) => return Err(other),
            }
        }

        Ok(outcome)
    }
}
