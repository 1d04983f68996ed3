use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{NewPayment, Payment, PeriodAggregate, SourceRecord, WorkRecord};
use crate::contract::{PaymentLog, SourceCatalog, SubjectDirectory, WorkLedger};
use crate::error::AppResult;

/// Postgres-backed store - THE source of truth for ledger and payment state.
///
/// One repository implements every collaborator port; production wiring
/// hands the same instance to the orchestrator and the settlement engine.
pub struct LedgerRepository {
    pub pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectDirectory for LedgerRepository {
    async fn resolve_by_native_id(&self, native_id: &str) -> AppResult<Option<Uuid>> {
        let employee_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM employees
            WHERE email = $1
            "#,
        )
        .bind(native_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee_id)
    }

    async fn hourly_rate(&self, employee_id: Uuid) -> AppResult<Option<Decimal>> {
        let rate = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT hourly_rate
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rate)
    }
}

#[async_trait]
impl SourceCatalog for LedgerRepository {
    async fn list_sources(&self) -> AppResult<Vec<SourceRecord>> {
        let sources = sqlx::query_as::<_, SourceRecord>(
            r#"
            SELECT id, kind, name, credential, details
            FROM sources
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sources)
    }
}

#[async_trait]
impl WorkLedger for LedgerRepository {
    async fn upsert_span(
        &self,
        employee_id: Uuid,
        source_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        hours: Decimal,
    ) -> AppResult<WorkRecord> {
        let record = sqlx::query_as::<_, WorkRecord>(
            r#"
            INSERT INTO work_records (employee_id, source_id, started_at, ended_at, hours)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (employee_id, source_id, started_at)
            DO UPDATE SET ended_at = EXCLUDED.ended_at, hours = EXCLUDED.hours
            RETURNING id, employee_id, source_id, started_at, ended_at, hours
            "#,
        )
        .bind(employee_id)
        .bind(source_id)
        .bind(started_at)
        .bind(ended_at)
        .bind(hours)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn aggregate_period(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Vec<PeriodAggregate>> {
        let aggregates = sqlx::query_as::<_, PeriodAggregate>(
            r#"
            SELECT employee_id, SUM(hours) AS total_hours
            FROM work_records
            WHERE started_at >= $1 AND started_at < $2
            GROUP BY employee_id
            ORDER BY employee_id
            "#,
        )
        .bind(period_start)
        .bind(period_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(aggregates)
    }
}

#[async_trait]
impl PaymentLog for LedgerRepository {
    async fn record_payments(&self, payments: Vec<NewPayment>) -> AppResult<Vec<Payment>> {
        let mut tx = self.pool.begin().await?;
        let mut recorded = Vec::with_capacity(payments.len());

        for payment in &payments {
            // Any failed insert drops the transaction and rolls back the batch.
            let row = sqlx::query_as::<_, Payment>(
                r#"
                INSERT INTO payments (employee_id, payment_date, total_hours, amount, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, employee_id, payment_date, total_hours, amount, status, created_at
                "#,
            )
            .bind(payment.employee_id)
            .bind(payment.payment_date)
            .bind(payment.total_hours)
            .bind(payment.amount)
            .bind(payment.status)
            .fetch_one(&mut *tx)
            .await?;

            recorded.push(row);
        }

        tx.commit().await?;
        Ok(recorded)
    }

    async fn payments_for_subject(&self, employee_id: Uuid) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, employee_id, payment_date, total_hours, amount, status, created_at
            FROM payments
            WHERE employee_id = $1
            ORDER BY payment_date DESC, created_at DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}
