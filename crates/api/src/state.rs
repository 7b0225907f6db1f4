use std::sync::Arc;

use paranoia_core::query::QueryService;
use paranoia_core::reconcile::ReconciliationEngine;
use paranoia_core::store::EntityStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the store is behind an `Arc` and the services hold
/// clones of it.
#[derive(Clone)]
pub struct AppState {
    /// Entity store shared by the engine and the query service.
    pub store: Arc<dyn EntityStore>,
    /// Write path for incoming observations.
    pub engine: ReconciliationEngine,
    /// Read path for entity listings and detail.
    pub query: QueryService,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the engine and query service to one store.
    pub fn new(store: Arc<dyn EntityStore>, config: ServerConfig) -> Self {
        let engine =
            ReconciliationEngine::with_max_attempts(Arc::clone(&store), config.merge_max_attempts);
        let query = QueryService::new(Arc::clone(&store));
        Self {
            store,
            engine,
            query,
            config: Arc::new(config),
        }
    }
}
