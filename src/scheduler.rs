//! Recurring-task driver for the two background jobs: the short-interval
//! sync tick and the monthly settlement run.
//!
//! Both jobs are also triggerable manually through the same entry points
//! the drivers call (`SyncOrchestrator::run_sync_all`,
//! `SettlementEngine::settle_period`). Ticks inside one driver task are
//! awaited sequentially, so a slow sync delays the next scheduled tick
//! rather than overlapping it; concurrent manual runs stay safe because
//! ledger upserts are atomic per key.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::settlement::SettlementEngine;
use crate::sync::SyncOrchestrator;

/// Schedule configuration
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Minutes between source polling runs
    pub sync_interval_minutes: u64,
    /// Day of month the settlement run fires, at 00:00 UTC (1-28)
    pub settlement_day_of_month: u32,
}

pub struct Scheduler {
    config: ScheduleConfig,
    orchestrator: Arc<SyncOrchestrator>,
    settlement: Arc<SettlementEngine>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        config: ScheduleConfig,
        orchestrator: Arc<SyncOrchestrator>,
        settlement: Arc<SettlementEngine>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            settlement,
            handles: Vec::new(),
        }
    }

    /// Spawn both recurring jobs in the background. Call once per process.
    pub fn start(&mut self) {
        let sync_handle = self.spawn_sync_tick();
        let settlement_handle = self.spawn_monthly_settlement();
        self.handles.push(sync_handle);
        self.handles.push(settlement_handle);

        info!(
            sync_interval_minutes = self.config.sync_interval_minutes,
            settlement_day_of_month = self.config.settlement_day_of_month,
            "Schedulers initialized successfully"
        );
    }

    /// Abort both driver tasks. In-flight database work completes or
    /// rolls back on its own; the drivers simply stop rescheduling.
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Schedulers stopped");
    }

    fn spawn_sync_tick(&self) -> JoinHandle<()> {
        let orchestrator = self.orchestrator.clone();
        let period = Duration::from_secs(self.config.sync_interval_minutes * 60);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick of a tokio interval completes immediately;
            // consume it so the job fires one full period after boot.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                info!("⏰ Running scheduled data refresh");

                match orchestrator.run_sync_all().await {
                    Ok(summary) => info!(
                        succeeded = summary.succeeded.len(),
                        failed = summary.failed.len(),
                        "scheduled sync complete"
                    ),
                    Err(e) => error!(error = %e, "scheduled sync failed"),
                }
            }
        })
    }

    fn spawn_monthly_settlement(&self) -> JoinHandle<()> {
        let settlement = self.settlement.clone();
        let day_of_month = self.config.settlement_day_of_month;

        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next_execution = next_monthly_execution(now, day_of_month);
                let wait = next_execution.signed_duration_since(now);

                if wait.num_seconds() > 0 {
                    info!(
                        "⏰ Next settlement scheduled for: {} UTC",
                        next_execution.format("%Y-%m-%d %H:%M:%S")
                    );
                    tokio::time::sleep(Duration::from_secs(wait.num_seconds() as u64)).await;
                }

                info!("🔄 Running monthly settlement");
                match settlement.settle_current_month().await {
                    Ok(payments) => {
                        info!(payments = payments.len(), "✓ Monthly settlement complete")
                    }
                    Err(e) => error!(error = %e, "❌ Monthly settlement failed"),
                }
            }
        })
    }
}

/// Next occurrence of `day_of_month` at 00:00 UTC strictly after `now`.
fn next_monthly_execution(now: DateTime<Utc>, day_of_month: u32) -> DateTime<Utc> {
    let this_month = now
        .date_naive()
        .with_day(day_of_month)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let this_month = Utc.from_utc_datetime(&this_month);

    // If the trigger instant has passed this month, schedule for next month
    if this_month > now {
        this_month
    } else {
        let (year, month) = if now.month() == 12 {
            (now.year() + 1, 1)
        } else {
            (now.year(), now.month() + 1)
        };
        let next = NaiveDate::from_ymd_opt(year, month, day_of_month)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Utc.from_utc_datetime(&next)
    }
}
