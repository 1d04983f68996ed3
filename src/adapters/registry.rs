use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::adapters::traits::TimeSource;
use crate::error::{AppError, AppResult};
use crate::ledger::models::SourceKind;

/// Maps each source kind to its adapter implementation. Dispatch happens
/// here once per source; callers never branch on kind themselves.
pub struct AdapterRegistry {
    adapters: HashMap<SourceKind, Arc<dyn TimeSource>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn TimeSource>) {
        info!("Registering time source adapter: {}", adapter.kind());
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn TimeSource>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn registered_kinds(&self) -> Vec<SourceKind> {
        self.adapters.keys().copied().collect()
    }

    /// Entry point for source-registration flows: validate a candidate
    /// credential against the live source before it is persisted.
    pub async fn verify(
        &self,
        kind: SourceKind,
        credential: &str,
        details: &serde_json::Value,
    ) -> AppResult<()> {
        let adapter = self
            .get(kind)
            .ok_or_else(|| AppError::NotFound(format!("no adapter registered for kind {kind}")))?;

        adapter.verify(credential, details).await?;
        Ok(())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
