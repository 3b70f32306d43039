//! Endpoint handlers for the gateway API.
//!
//! Every route accepts any method. Handlers authenticate first (where the
//! route requires it), then parse query parameters, then delegate to the
//! account, save-data, counter, or daily modules.
//!
//! # Endpoints
//!
//! | Path | Auth | Response |
//! |------|------|----------|
//! | `/api/account/info` | yes | `{username, lastSessionSlot}` |
//! | `/api/account/register` | no | empty |
//! | `/api/account/login` | no | `{token}` |
//! | `/api/account/logout` | yes | empty |
//! | `/api/game/playercount` | no | integer |
//! | `/api/game/titlestats` | no | `{playerCount, battleCount}` |
//! | `/api/game/classicsessioncount` | no | integer |
//! | `/api/savedata/get` | yes | save JSON |
//! | `/api/savedata/update` | yes | empty |
//! | `/api/savedata/delete` | yes | empty |
//! | `/api/savedata/clear` | yes | `{success}` |
//! | `/api/daily/seed` | no | seed |
//! | `/api/daily/rankings` | yes | ranking entries |
//! | `/api/daily/rankingpagecount` | no | integer |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use rogue_types::{AccountInfo, RankingCategory};
use serde::Serialize;

use crate::account::{self, Credentials};
use crate::auth;
use crate::error::GatewayError;
use crate::savedata::{self, SaveOperation, SaveOutcome, SaveRequest, parse_int_param};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `/api/savedata/*` endpoints.
///
/// Kept as raw strings so a non-integer value is a `400` with a useful
/// message instead of an extractor rejection.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SaveDataQuery {
    /// `0` for system data, `1` for session data.
    pub datatype: Option<String>,
    /// Slot index (default 0).
    pub slot: Option<String>,
}

/// Query parameters for the `/api/daily/*` ranking endpoints.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RankingsQuery {
    /// `0` for daily, `1` for weekly (default 0).
    pub category: Option<String>,
    /// 1-based page (default 1).
    pub page: Option<String>,
}

fn query<T>(extracted: Result<Query<T>, QueryRejection>) -> Result<T, GatewayError> {
    extracted
        .map(|Query(inner)| inner)
        .map_err(|e| GatewayError::bad_request(e.body_text()))
}

fn form<T>(extracted: Result<Form<T>, FormRejection>) -> Result<T, GatewayError> {
    extracted
        .map(|Form(inner)| inner)
        .map_err(|e| GatewayError::bad_request(e.body_text()))
}

/// Encode `value` as a JSON response.
fn json_response<T: Serialize>(value: &T) -> Result<Response, GatewayError> {
    let body = serde_json::to_vec(value)?;
    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

fn category_param(raw: Option<&str>) -> Result<RankingCategory, GatewayError> {
    let code = parse_int_param::<i64>("category", raw)?.unwrap_or(0);
    RankingCategory::try_from(code).map_err(|e| GatewayError::bad_request(e.to_string()))
}

// ---------------------------------------------------------------------------
// /api/account
// ---------------------------------------------------------------------------

/// Username and most recent session slot of the calling account.
pub async fn account_info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let username = auth::username_from_header(&*state.store, &headers).await?;
    let uuid = auth::uuid_from_header(&*state.store, &headers).await?;
    let info: AccountInfo = account::info(&*state.store, username, uuid).await?;
    json_response(&info)
}

/// Create an account from the `username` and `password` form fields.
pub async fn account_register(
    State(state): State<Arc<AppState>>,
    credentials: Result<Form<Credentials>, FormRejection>,
) -> Result<StatusCode, GatewayError> {
    account::register(&*state.store, form(credentials)?).await?;
    Ok(StatusCode::OK)
}

/// Log in and return a fresh session token.
pub async fn account_login(
    State(state): State<Arc<AppState>>,
    credentials: Result<Form<Credentials>, FormRejection>,
) -> Result<Response, GatewayError> {
    let response = account::login(&*state.store, form(credentials)?).await?;
    json_response(&response)
}

/// End the session named by the `Authorization` header.
pub async fn account_logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, GatewayError> {
    let token = auth::token_from_header(&headers)?;
    account::logout(&*state.store, &token).await?;
    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// /api/game
// ---------------------------------------------------------------------------

/// Recently active players, as plain text.
pub async fn player_count(State(state): State<Arc<AppState>>) -> String {
    state.counters.player_count().to_string()
}

/// Title-screen counters as JSON.
pub async fn title_stats(State(state): State<Arc<AppState>>) -> Result<Response, GatewayError> {
    json_response(&state.counters.title_stats())
}

/// Classic runs in progress, as plain text.
pub async fn classic_session_count(State(state): State<Arc<AppState>>) -> String {
    state.counters.classic_session_count().to_string()
}

// ---------------------------------------------------------------------------
// /api/savedata
// ---------------------------------------------------------------------------

async fn save_data(
    state: &AppState,
    op: SaveOperation,
    headers: &HeaderMap,
    params: Result<Query<SaveDataQuery>, QueryRejection>,
    body: &[u8],
) -> Result<Response, GatewayError> {
    let uuid = auth::uuid_from_header(&*state.store, headers).await?;

    let params = query(params)?;
    let datatype = parse_int_param::<i64>("datatype", params.datatype.as_deref())?;
    let slot = parse_int_param::<i32>("slot", params.slot.as_deref())?;

    let request = SaveRequest::resolve(op, datatype, slot, body)?;
    match savedata::execute(&*state.store, &state.daily, uuid, request).await? {
        SaveOutcome::Empty => Ok(StatusCode::OK.into_response()),
        SaveOutcome::Save(save) => json_response(&save),
        SaveOutcome::Cleared(cleared) => json_response(&cleared),
    }
}

/// Read one save.
pub async fn savedata_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<SaveDataQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    save_data(&state, SaveOperation::Get, &headers, params, &body).await
}

/// Write one save. Always answers with an empty body.
pub async fn savedata_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<SaveDataQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    save_data(&state, SaveOperation::Update, &headers, params, &body).await
}

/// Remove one save.
pub async fn savedata_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<SaveDataQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    save_data(&state, SaveOperation::Delete, &headers, params, &body).await
}

/// Finish a run and free its slot.
pub async fn savedata_clear(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<SaveDataQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    save_data(&state, SaveOperation::Clear, &headers, params, &body).await
}

// ---------------------------------------------------------------------------
// /api/daily
// ---------------------------------------------------------------------------

/// Today's seed, as plain text.
pub async fn daily_seed(State(state): State<Arc<AppState>>) -> Result<String, GatewayError> {
    Ok(state.daily.seed().await?)
}

/// One page of rankings.
pub async fn daily_rankings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    params: Result<Query<RankingsQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let uuid = auth::uuid_from_header(&*state.store, &headers).await?;

    let params = query(params)?;
    let category = category_param(params.category.as_deref())?;
    let page = parse_int_param::<i64>("page", params.page.as_deref())?.unwrap_or(1);

    let entries = state.daily.rankings(uuid, category, page).await?;
    json_response(&entries)
}

/// Number of ranking pages, as plain text.
pub async fn daily_ranking_page_count(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RankingsQuery>, QueryRejection>,
) -> Result<String, GatewayError> {
    let params = query(params)?;
    let category = category_param(params.category.as_deref())?;
    let pages = state.daily.ranking_page_count(category).await?;
    Ok(pages.to_string())
}

/// Unmatched `/api` paths.
pub async fn api_not_found() -> (StatusCode, &'static str) {
    tracing::debug!("No API route matched");
    (StatusCode::NOT_FOUND, "not found")
}
