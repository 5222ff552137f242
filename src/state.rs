//! Shared application state.

use crate::config::RunnerConfig;
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::provider::ProviderRegistry;
use crate::routes::ViewRouter;
use crate::store::SessionStore;
use std::sync::Arc;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ExecutionEngine>,
    pub views: Arc<ViewRouter>,
}

impl AppState {
    /// Build the store, the HTTP-backed providers and the engine from `config`.
    /// Fails if the selected interpreter or sandbox host is not registered.
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &RunnerConfig) -> Result<Self> {
        let providers = ProviderRegistry::from_config(config)?;
        providers.check_selected(config)?;
        Ok(Self::with_providers(config, providers))
    }

    pub fn with_providers(config: &RunnerConfig, providers: ProviderRegistry) -> Self {
        let store = SessionStore::new(config.session_ttl);
        Self {
            engine: Arc::new(ExecutionEngine::new(store, providers, config)),
            views: Arc::new(ViewRouter::default()),
        }
    }
}
