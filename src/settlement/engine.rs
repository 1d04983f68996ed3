//! Settlement: aggregate ledger hours per employee over a period and
//! record one payment per employee, atomically for the whole run.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::contract::{PaymentLog, SubjectDirectory, WorkLedger};
use crate::error::{AppError, AppResult, SettlementError};
use crate::ledger::models::{NewPayment, PaymentStatus};

/// One employee's computed settlement for a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementLine {
    pub employee_id: Uuid,
    pub total_hours: Decimal,
    pub amount: Decimal,
}

pub struct SettlementEngine {
    ledger: Arc<dyn WorkLedger>,
    directory: Arc<dyn SubjectDirectory>,
    payments: Arc<dyn PaymentLog>,
}

impl SettlementEngine {
    pub fn new(
        ledger: Arc<dyn WorkLedger>,
        directory: Arc<dyn SubjectDirectory>,
        payments: Arc<dyn PaymentLog>,
    ) -> Self {
        Self {
            ledger,
            directory,
            payments,
        }
    }

    /// Settle `[period_start, period_end)`: one payment per employee with
    /// ledger hours in the window, `amount = round(hours × rate, 2)`.
    ///
    /// All-or-nothing across the whole employee set: a missing rate or a
    /// failed insert aborts the run and nothing from it persists. There
    /// is no guard against settling the same period twice; a repeated run
    /// records a second payment per employee.
    pub async fn settle_period(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<HashMap<Uuid, Uuid>> {
        info!(%period_start, %period_end, "starting settlement run");

        let lines = self
            .compute_period(period_start, period_end)
            .await
            .map_err(abort)?;

        if lines.is_empty() {
            info!("no ledger hours in window; nothing to settle");
            return Ok(HashMap::new());
        }

        let payment_date = Utc::now().date_naive();
        let pending: Vec<NewPayment> = lines
            .iter()
            .map(|line| NewPayment {
                employee_id: line.employee_id,
                payment_date,
                total_hours: line.total_hours,
                amount: line.amount,
                status: PaymentStatus::Recorded,
            })
            .collect();

        let recorded = self
            .payments
            .record_payments(pending)
            .await
            .map_err(abort)?;

        for payment in &recorded {
            info!(
                employee_id = %payment.employee_id,
                total_hours = %payment.total_hours,
                amount = %payment.amount,
                "payment recorded"
            );
        }
        info!(payments = recorded.len(), "settlement run complete");

        Ok(recorded
            .into_iter()
            .map(|payment| (payment.employee_id, payment.id))
            .collect())
    }

    /// Settle the current month-to-date window. This is what the monthly
    /// scheduled trigger fires.
    pub async fn settle_current_month(&self) -> AppResult<HashMap<Uuid, Uuid>> {
        let (period_start, period_end) = month_to_date_window(Utc::now());
        self.settle_period(period_start, period_end).await
    }

    /// Same aggregation and amount computation as a settlement run, with
    /// no payment records written. Operator-facing dry run.
    pub async fn preview_period(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Vec<SettlementLine>> {
        self.compute_period(period_start, period_end).await
    }

    async fn compute_period(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Vec<SettlementLine>> {
        let aggregates = self.ledger.aggregate_period(period_start, period_end).await?;
        let mut lines = Vec::with_capacity(aggregates.len());

        for aggregate in aggregates {
            let rate = self
                .directory
                .hourly_rate(aggregate.employee_id)
                .await?
                .ok_or(SettlementError::MissingRate(aggregate.employee_id))?;

            let amount = (aggregate.total_hours * rate)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            lines.push(SettlementLine {
                employee_id: aggregate.employee_id,
                total_hours: aggregate.total_hours,
                amount,
            });
        }

        Ok(lines)
    }
}

/// Every failure of a settlement run surfaces as a run-level abort.
fn abort(error: AppError) -> AppError {
    match error {
        AppError::Settlement(inner) => AppError::Settlement(inner),
        other => AppError::Settlement(SettlementError::Aborted(other.to_string())),
    }
}

/// Window from the first instant of `now`'s month up to `now` itself.
pub fn month_to_date_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let month_start = now
        .date_naive()
        .with_day(1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    (month_start, now)
}
