//! HTTP gateway for the Rogue game backend.
//!
//! This crate provides an Axum server that:
//!
//! - authenticates players by the session token in `Authorization`
//! - stores and serves system and session save data
//! - publishes title-screen counters refreshed in the background
//! - hands out the daily seed and daily/weekly rankings
//! - serves the game client's static files for every non-`/api` path
//!
//! # Architecture
//!
//! ```text
//! router --> handlers --+--> auth (token --> identity)
//!                       +--> account
//!                       +--> savedata (resolve --> execute)
//!                       +--> counters <-- refresh task
//!                       +--> daily    <-- rotation task
//!                                |
//!                       rogue_db::GameStore
//! ```
//!
//! Handlers hold no state of their own; everything shared lives in
//! [`AppState`].

pub mod account;
pub mod auth;
pub mod config;
pub mod counters;
pub mod daily;
pub mod error;
pub mod handlers;
pub mod router;
pub mod savedata;
pub mod server;
pub mod startup;
pub mod state;
pub mod token;

// Re-export primary types for convenience.
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
