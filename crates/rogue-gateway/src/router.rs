//! Axum router construction for the gateway.
//!
//! `/api` routes are matched exactly and accept any method. Anything under
//! `/api` that is not listed gets a plain `404`; every other path is
//! served from the static file directory.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::routing::any;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the gateway.
///
/// CORS is open to any origin; the game client is usually served from a
/// different host than the API.
pub fn build_router(state: Arc<AppState>, www_path: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    Router::new()
        // Accounts
        .route("/api/account/info", any(handlers::account_info))
        .route("/api/account/register", any(handlers::account_register))
        .route("/api/account/login", any(handlers::account_login))
        .route("/api/account/logout", any(handlers::account_logout))
        // Title-screen counters
        .route("/api/game/playercount", any(handlers::player_count))
        .route("/api/game/titlestats", any(handlers::title_stats))
        .route(
            "/api/game/classicsessioncount",
            any(handlers::classic_session_count),
        )
        // Save data
        .route("/api/savedata/get", any(handlers::savedata_get))
        .route("/api/savedata/update", any(handlers::savedata_update))
        .route("/api/savedata/delete", any(handlers::savedata_delete))
        .route("/api/savedata/clear", any(handlers::savedata_clear))
        // Daily runs
        .route("/api/daily/seed", any(handlers::daily_seed))
        .route("/api/daily/rankings", any(handlers::daily_rankings))
        .route(
            "/api/daily/rankingpagecount",
            any(handlers::daily_ranking_page_count),
        )
        // Everything else under /api
        .route("/api", any(handlers::api_not_found))
        .route("/api/{*rest}", any(handlers::api_not_found))
        // Static client files
        .fallback_service(ServeDir::new(www_path))
        .layer(cors)
        .layer(trace)
        .with_state(state)
}
