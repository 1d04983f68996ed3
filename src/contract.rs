//! Collaborator ports consumed by the sync and settlement cores.
//!
//! Production wires every port to [`crate::ledger::LedgerRepository`];
//! tests substitute in-memory implementations. All ports are object-safe
//! so components hold them as `Arc<dyn …>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::models::{NewPayment, Payment, PeriodAggregate, SourceRecord, WorkRecord};

/// Read-only view of the employee directory.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// Resolve a source-native identifier (an email address) to an
    /// employee id. `None` means the span carrying it must be dropped.
    async fn resolve_by_native_id(&self, native_id: &str) -> AppResult<Option<Uuid>>;

    /// Hourly compensation rate for an employee, if one is on file.
    async fn hourly_rate(&self, employee_id: Uuid) -> AppResult<Option<Decimal>>;
}

/// Read-only view of the registered integration sources.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// All registered sources, in registration order. Processing order
    /// within a sync run follows this listing.
    async fn list_sources(&self) -> AppResult<Vec<SourceRecord>>;
}

/// The durable work-time ledger.
#[async_trait]
pub trait WorkLedger: Send + Sync {
    /// Insert or overwrite the record for (employee, source, started_at).
    /// Atomic per key: concurrent writers to the same key serialize on
    /// the store's own upsert.
    async fn upsert_span(
        &self,
        employee_id: Uuid,
        source_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        hours: Decimal,
    ) -> AppResult<WorkRecord>;

    /// Sum ledger hours per employee for records whose interval start
    /// falls in `[period_start, period_end)`.
    async fn aggregate_period(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Vec<PeriodAggregate>>;
}

/// The durable, append-only payment store.
#[async_trait]
pub trait PaymentLog: Send + Sync {
    /// Record a batch of payments. All-or-nothing: if any insert fails,
    /// no payment from the batch persists.
    async fn record_payments(&self, payments: Vec<NewPayment>) -> AppResult<Vec<Payment>>;

    /// Payment history for one employee, newest first.
    async fn payments_for_subject(&self, employee_id: Uuid) -> AppResult<Vec<Payment>>;
}
