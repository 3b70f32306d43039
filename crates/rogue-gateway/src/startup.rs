//! Process startup: open the store, seed the daily subsystem, start the
//! background tasks, and serve until shutdown.
//!
//! # Startup sequence
//!
//! 1. Open the configured store (`PostgreSQL` runs pending migrations)
//! 2. Ensure a daily seed exists for the current UTC date
//! 3. Spawn the counter refresh and daily seed rotation tasks
//! 4. Serve HTTP until `Ctrl-C`
//! 5. Stop the background tasks and close the pool

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rogue_db::{DbError, GameStore, MemoryStore, PostgresConfig, PostgresPool};
use tracing::{info, warn};

use crate::config::{GatewayConfig, StoreBackend, StoreConfig};
use crate::counters::spawn_refresh;
use crate::daily::spawn_rotation;
use crate::server::{ServerError, start_server};
use crate::state::AppState;

/// Errors that can abort the gateway.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The store could not be opened or seeded.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The server failed to bind or stopped with an error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

/// An opened store plus the pool handle, if any, to close on shutdown.
pub struct OpenedStore {
    /// Store handed to the gateway.
    pub store: Arc<dyn GameStore>,
    /// Pool behind `store` when the backend is `PostgreSQL`.
    pub pool: Option<PostgresPool>,
}

/// Open the store selected by `config`.
///
/// # Errors
///
/// Returns [`StartupError::Store`] if `PostgreSQL` cannot be reached or
/// migrated.
pub async fn open_store(config: &StoreConfig) -> Result<OpenedStore, StartupError> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = PostgresPool::open(
                &PostgresConfig::new(&config.database_url)
                    .with_max_connections(config.max_connections)
                    .with_acquire_timeout(Duration::from_secs(config.connect_timeout_secs)),
            )
            .await?;
            Ok(OpenedStore {
                store: Arc::new(pool.clone()),
                pool: Some(pool),
            })
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; nothing is persisted");
            Ok(OpenedStore {
                store: Arc::new(MemoryStore::new()),
                pool: None,
            })
        }
    }
}

/// Run the gateway with `config` until shutdown.
///
/// # Errors
///
/// Returns [`StartupError`] if the store cannot be opened, the daily seed
/// cannot be created, or the server fails.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let OpenedStore { store, pool } = open_store(&config.store).await?;
    let state = Arc::new(AppState::new(Arc::clone(&store)));

    state.daily.ensure_seed(Utc::now().date_naive()).await?;
    info!("Daily seed ready");

    let refresh = spawn_refresh(
        Arc::clone(&state.counters),
        store,
        config.stats.refresh_interval(),
    );
    let rotation = spawn_rotation(Arc::clone(&state.daily));

    let served = start_server(&config.server, state).await;

    refresh.abort();
    rotation.abort();
    if let Some(pool) = pool {
        pool.close().await;
    }

    served?;
    Ok(())
}
