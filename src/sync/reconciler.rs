//! Idempotent reconciliation of canonical time-spans into the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::WorkLedger;
use crate::error::{AppError, AppResult};
use crate::ledger::models::WorkRecord;

pub struct Reconciler {
    ledger: Arc<dyn WorkLedger>,
}

impl Reconciler {
    pub fn new(ledger: Arc<dyn WorkLedger>) -> Self {
        Self { ledger }
    }

    /// Upsert one span keyed on (employee, source, started_at).
    ///
    /// Duration is always recomputed from the interval here; whatever
    /// notion of hours the source payload carried is discarded. Spans
    /// where the end does not lie after the start are rejected without
    /// touching the ledger.
    pub async fn reconcile(
        &self,
        employee_id: Uuid,
        source_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> AppResult<WorkRecord> {
        if ended_at <= started_at {
            return Err(AppError::InvalidInterval {
                started_at,
                ended_at,
            });
        }

        let hours = span_hours(started_at, ended_at);
        self.ledger
            .upsert_span(employee_id, source_id, started_at, ended_at, hours)
            .await
    }
}

/// Hours between two instants, rounded to two decimal places.
pub(crate) fn span_hours(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Decimal {
    let seconds = (ended_at - started_at).num_seconds();
    (Decimal::from(seconds) / Decimal::from(3600))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
