use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salarysync::{
    bootstrap,
    config::Config,
    scheduler::{ScheduleConfig, Scheduler},
};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,salarysync=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("🚀 Starting Integration Sync & Payroll Settlement Service");

    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    let state = bootstrap::initialize_app_state(&config).await?;

    let mut scheduler = Scheduler::new(
        ScheduleConfig {
            sync_interval_minutes: config.sync_interval_minutes,
            settlement_day_of_month: config.settlement_day_of_month,
        },
        state.orchestrator.clone(),
        state.settlement.clone(),
    );
    scheduler.start();

    info!("🌐 Service started successfully; Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    scheduler.stop();

    Ok(())
}
