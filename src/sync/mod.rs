pub mod orchestrator;
pub mod reconciler;

pub use orchestrator::{SyncFailure, SyncOrchestrator, SyncSummary};
pub use reconciler::Reconciler;
