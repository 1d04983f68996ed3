use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tracing::info;

use crate::{
    adapters::{sheets::SheetsTimeSource, usage::UsageApiTimeSource, AdapterRegistry},
    config::Config,
    contract::{PaymentLog, SourceCatalog, SubjectDirectory, WorkLedger},
    error::AppResult,
    ledger::LedgerRepository,
    settlement::SettlementEngine,
    sync::{Reconciler, SyncOrchestrator},
};

/// Fully wired application components. The scheduler and any manual
/// trigger surface both drive the orchestrator and settlement engine
/// held here.
pub struct AppState {
    pub repository: Arc<LedgerRepository>,
    pub registry: Arc<AdapterRegistry>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub settlement: Arc<SettlementEngine>,
}

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;
    let repository = Arc::new(LedgerRepository::new(pool));

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(SheetsTimeSource::new()));
    registry.register(Arc::new(UsageApiTimeSource::new()));
    let registry = Arc::new(registry);
    info!(
        "✅ {} time source adapters registered",
        registry.registered_kinds().len()
    );

    let reconciler = Reconciler::new(repository.clone() as Arc<dyn WorkLedger>);
    let orchestrator = Arc::new(SyncOrchestrator::new(
        repository.clone() as Arc<dyn SourceCatalog>,
        repository.clone() as Arc<dyn SubjectDirectory>,
        registry.clone(),
        reconciler,
        Duration::from_secs(config.source_fetch_timeout_secs),
    ));
    info!("✅ Sync orchestrator initialized");

    let settlement = Arc::new(SettlementEngine::new(
        repository.clone() as Arc<dyn WorkLedger>,
        repository.clone() as Arc<dyn SubjectDirectory>,
        repository.clone() as Arc<dyn PaymentLog>,
    ));
    info!("✅ Settlement engine initialized");

    Ok(AppState {
        repository,
        registry,
        orchestrator,
        settlement,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await?;

    info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("✓ Database initialized");
    Ok(pool)
}
