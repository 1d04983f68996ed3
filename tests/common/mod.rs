//! In-memory implementations of the collaborator ports, plus a scripted
//! time source, for driving the orchestrator and settlement engine
//! without a database or network.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use salarysync::adapters::traits::TimeSource;
use salarysync::contract::{PaymentLog, SourceCatalog, SubjectDirectory, WorkLedger};
use salarysync::error::{AppError, AppResult, SourceError};
use salarysync::ledger::models::{
    NativeSpan, NewPayment, Payment, PeriodAggregate, SourceKind, SourceRecord, WorkRecord,
};

pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("test timestamp")
        .with_timezone(&Utc)
}

pub fn source_record(id: Uuid, kind: SourceKind, name: &str) -> SourceRecord {
    SourceRecord {
        id,
        kind,
        name: name.to_string(),
        credential: "test-token".to_string(),
        details: serde_json::json!({}),
    }
}

pub fn native_span(email: &str, start: &str, end: &str) -> NativeSpan {
    NativeSpan {
        native_subject_id: email.to_string(),
        started_at: ts(start),
        ended_at: ts(end),
    }
}

// ---------- subject directory ----------

#[derive(Default)]
pub struct MemoryDirectory {
    by_email: HashMap<String, Uuid>,
    rates: HashMap<Uuid, Decimal>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(mut self, email: &str, employee_id: Uuid, rate: Option<Decimal>) -> Self {
        self.by_email.insert(email.to_string(), employee_id);
        if let Some(rate) = rate {
            self.rates.insert(employee_id, rate);
        }
        self
    }
}

#[async_trait]
impl SubjectDirectory for MemoryDirectory {
    async fn resolve_by_native_id(&self, native_id: &str) -> AppResult<Option<Uuid>> {
        Ok(self.by_email.get(native_id).copied())
    }

    async fn hourly_rate(&self, employee_id: Uuid) -> AppResult<Option<Decimal>> {
        Ok(self.rates.get(&employee_id).copied())
    }
}

// ---------- source catalog ----------

pub struct MemoryCatalog {
    sources: Vec<SourceRecord>,
    fail_listing: bool,
}

impl MemoryCatalog {
    pub fn new(sources: Vec<SourceRecord>) -> Self {
        Self {
            sources,
            fail_listing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sources: Vec::new(),
            fail_listing: true,
        }
    }
}

#[async_trait]
impl SourceCatalog for MemoryCatalog {
    async fn list_sources(&self) -> AppResult<Vec<SourceRecord>> {
        if self.fail_listing {
            return Err(AppError::Internal("source listing unavailable".to_string()));
        }
        Ok(self.sources.clone())
    }
}

// ---------- work ledger ----------

type LedgerKey = (Uuid, Uuid, DateTime<Utc>);

#[derive(Default)]
pub struct MemoryLedger {
    records: Mutex<HashMap<LedgerKey, WorkRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn get(&self, employee_id: Uuid, source_id: Uuid, started_at: DateTime<Utc>) -> Option<WorkRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(employee_id, source_id, started_at))
            .cloned()
    }

    /// Seed a record directly, bypassing the reconciler.
    pub fn seed(&self, employee_id: Uuid, source_id: Uuid, start: &str, end: &str, hours: Decimal) {
        let started_at = ts(start);
        self.records.lock().unwrap().insert(
            (employee_id, source_id, started_at),
            WorkRecord {
                id: Uuid::new_v4(),
                employee_id,
                source_id,
                started_at,
                ended_at: ts(end),
                hours,
            },
        );
    }
}

#[async_trait]
impl WorkLedger for MemoryLedger {
    async fn upsert_span(
        &self,
        employee_id: Uuid,
        source_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        hours: Decimal,
    ) -> AppResult<WorkRecord> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry((employee_id, source_id, started_at))
            .and_modify(|existing| {
                existing.ended_at = ended_at;
                existing.hours = hours;
            })
            .or_insert_with(|| WorkRecord {
                id: Uuid::new_v4(),
                employee_id,
                source_id,
                started_at,
                ended_at,
                hours,
            });
        Ok(record.clone())
    }

    async fn aggregate_period(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> AppResult<Vec<PeriodAggregate>> {
        let records = self.records.lock().unwrap();
        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();

        for record in records.values() {
            if record.started_at >= period_start && record.started_at < period_end {
                *totals.entry(record.employee_id).or_default() += record.hours;
            }
        }

        let mut aggregates: Vec<PeriodAggregate> = totals
            .into_iter()
            .map(|(employee_id, total_hours)| PeriodAggregate {
                employee_id,
                total_hours,
            })
            .collect();
        aggregates.sort_by_key(|aggregate| aggregate.employee_id);
        Ok(aggregates)
    }
}

// ---------- payment log ----------

#[derive(Default)]
pub struct MemoryPayments {
    payments: Mutex<Vec<Payment>>,
    /// Fail the batch once this many inserts have succeeded.
    fail_after: Option<usize>,
}

impl MemoryPayments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(successful_inserts: usize) -> Self {
        Self {
            payments: Mutex::new(Vec::new()),
            fail_after: Some(successful_inserts),
        }
    }

    pub fn recorded(&self) -> Vec<Payment> {
        self.payments.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentLog for MemoryPayments {
    async fn record_payments(&self, payments: Vec<NewPayment>) -> AppResult<Vec<Payment>> {
        let mut staged = Vec::with_capacity(payments.len());

        for (index, payment) in payments.iter().enumerate() {
            if Some(index) == self.fail_after {
                // Nothing staged survives; the batch rolls back whole.
                return Err(AppError::Internal(
                    "simulated payment insert failure".to_string(),
                ));
            }
            staged.push(Payment {
                id: Uuid::new_v4(),
                employee_id: payment.employee_id,
                payment_date: payment.payment_date,
                total_hours: payment.total_hours,
                amount: payment.amount,
                status: payment.status,
                created_at: Utc::now(),
            });
        }

        self.payments.lock().unwrap().extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn payments_for_subject(&self, employee_id: Uuid) -> AppResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|payment| payment.employee_id == employee_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

// ---------- scripted time source ----------

pub enum Script {
    Spans(Vec<NativeSpan>),
    Fail(String),
    /// Never returns; used to exercise the orchestrator's fetch timeout.
    Hang,
}

pub struct ScriptedSource {
    kind: SourceKind,
    scripts: HashMap<Uuid, Script>,
}

impl ScriptedSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            scripts: HashMap::new(),
        }
    }

    pub fn with_script(mut self, source_id: Uuid, script: Script) -> Self {
        self.scripts.insert(source_id, script);
        self
    }
}

#[async_trait]
impl TimeSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_spans(&self, source: &SourceRecord) -> Result<Vec<NativeSpan>, SourceError> {
        match self.scripts.get(&source.id) {
            Some(Script::Spans(spans)) => Ok(spans.clone()),
            Some(Script::Fail(reason)) => Err(SourceError::Unreachable(reason.clone())),
            Some(Script::Hang) => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn verify(
        &self,
        _credential: &str,
        _details: &serde_json::Value,
    ) -> Result<(), SourceError> {
        Ok(())
    }
}
