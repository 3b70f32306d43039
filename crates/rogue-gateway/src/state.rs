//! Shared application state for the gateway.
//!
//! [`AppState`] is built once at startup and injected into every handler
//! via Axum's `State` extractor. It holds no per-request data: the store
//! handle, the counter registry shared with the stat refresh task, and
//! the daily service shared with the seed rotation task.

use std::sync::Arc;

use rogue_db::{GameStore, MemoryStore};

use crate::counters::CounterRegistry;
use crate::daily::DailyService;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator.
    pub store: Arc<dyn GameStore>,
    /// Title-screen counters, refreshed in the background.
    pub counters: Arc<CounterRegistry>,
    /// Current daily seed and ranking queries.
    pub daily: Arc<DailyService>,
}

impl AppState {
    /// Create state over `store` with zeroed counters and no daily seed yet.
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            daily: Arc::new(DailyService::new(Arc::clone(&store))),
            counters: Arc::new(CounterRegistry::new()),
            store,
        }
    }

    /// Create state over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
