use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::Type;
use std::fmt;
use uuid::Uuid;

/// Closed set of external source kinds the engine can poll.
/// Adding a kind means adding one variant and one adapter implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "source_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    GoogleSheets,
    UsageApi,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::GoogleSheets => "google_sheets",
            SourceKind::UsageApi => "usage_api",
        }
    }

    /// Return all supported source kinds
    pub fn all() -> Vec<SourceKind> {
        vec![SourceKind::GoogleSheets, SourceKind::UsageApi]
    }

    /// Parse the stable string form used by registration flows.
    pub fn parse(raw: &str) -> Option<SourceKind> {
        match raw {
            "google_sheets" => Some(SourceKind::GoogleSheets),
            "usage_api" => Some(SourceKind::UsageApi),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered external source, as read from the source catalog.
/// The engine only consumes id, kind, credential and details; everything
/// else about a source is owned by the integration-management service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SourceRecord {
    pub id: Uuid,
    pub kind: SourceKind,
    pub name: String,
    pub credential: String,
    pub details: serde_json::Value,
}

/// Canonical time-span emitted by an adapter, keyed by the source-native
/// subject identifier (an email address for both current source kinds).
/// In-flight only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSpan {
    pub native_subject_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Durable work-time ledger entry.
///
/// INVARIANT: at most one record per (employee_id, source_id, started_at);
/// re-ingesting the same interval overwrites ended_at and hours in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub source_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,

    #[serde(with = "rust_decimal::serde::float")]
    pub hours: Decimal,
}

/// Summed ledger hours for one employee over a settlement period.
#[derive(Debug, Clone, FromRow)]
pub struct PeriodAggregate {
    pub employee_id: Uuid,
    pub total_hours: Decimal,
}

/// Payment status enum
///
/// Payments are append-only; a record never changes status after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Recorded,
}

/// Payment to be recorded by a settlement run.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub employee_id: Uuid,
    pub payment_date: NaiveDate,
    pub total_hours: Decimal,
    pub amount: Decimal,
    pub status: PaymentStatus,
}

/// Recorded payment entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub payment_date: NaiveDate,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_hours: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
