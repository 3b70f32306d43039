//! Data layer for the Rogue game gateway.
//!
//! The gateway treats persistence as a collaborator behind the traits in
//! [`store`]. Two implementations are provided:
//!
//! ```text
//! GameStore (AccountStore + SaveDataStore + DailyStore + StatsStore)
//!     |
//!     +-- PostgresPool  (production, sqlx)
//!     |     |-- account_store    (accounts, sessions, account_stats)
//!     |     |-- savedata_store   (system_saves, session_saves)
//!     |     |-- daily_store      (daily_seeds, account_daily_runs)
//!     |     +-- stats_store      (title-screen aggregates)
//!     |
//!     +-- MemoryStore   (tests, local development)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- Store traits and shared validation helpers
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`memory`] -- In-process store
//! - [`error`] -- Shared error types

mod account_store;
mod daily_store;
pub mod error;
pub mod memory;
pub mod postgres;
mod savedata_store;
mod stats_store;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use store::{
    AccountCredentials, AccountStore, DailyStore, GameStore, NewAccount, SESSION_TTL_DAYS,
    SaveDataStore, StatsStore,
};
