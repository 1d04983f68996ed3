//! Integration synchronization & payroll settlement engine.
//!
//! Polls heterogeneous worked-time sources on a recurring schedule,
//! reconciles the normalized spans into a durable work-time ledger, and
//! settles accrued hours into payment records once a month.
//!
//! Entry points exposed to the surrounding services:
//! - [`sync::SyncOrchestrator::run_sync_all`] — one full polling pass,
//!   fired by the scheduler and by manual refresh actions.
//! - [`settlement::SettlementEngine::settle_period`] — aggregate and
//!   record payments for a window, fired monthly and on demand.
//! - [`adapters::AdapterRegistry::verify`] — credential validation for
//!   source-registration flows.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod scheduler;
pub mod settlement;
pub mod sync;
