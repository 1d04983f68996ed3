use chrono::{DateTime, Utc};
use sqlx::migrate::MigrateError;
use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Invalid interval: end {ended_at} is not after start {started_at}")]
    InvalidInterval {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Adapter-level errors. Scoped to a single source and recoverable by
/// skipping that source for the current sync run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source unreachable: {0}")]
    Unreachable(String),

    #[error("source credential invalid: {0}")]
    CredentialInvalid(String),

    #[error("source payload malformed: {0}")]
    MalformedPayload(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return SourceError::MalformedPayload(error.to_string());
        }

        match error.status() {
            Some(status)
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                SourceError::CredentialInvalid(error.to_string())
            }
            _ => SourceError::Unreachable(error.to_string()),
        }
    }
}

/// Settlement errors are fatal for the whole run: the transaction is
/// rolled back and no payment record from the run survives.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("settlement aborted: no hourly rate on file for employee {0}")]
    MissingRate(Uuid),

    #[error("settlement aborted: {0}")]
    Aborted(String),
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("{error:?}"))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {error:?}"))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
