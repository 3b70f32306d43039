//! Integration tests for the gateway API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over a fresh in-memory store per test.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rogue_gateway::build_router;
use rogue_gateway::counters::StatsSnapshot;
use rogue_gateway::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

const SESSION_BODY: &str = r#"{"seed":"abc","gameMode":0,"waveIndex":12,"score":40,"party":[]}"#;

fn make_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::in_memory());
    let router = build_router(Arc::clone(&state), "tests/no-such-www");
    (router, state)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

fn body_to_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(AUTHORIZATION, token)
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn credentials(uri: &str, username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

/// Register `foo` and log in, returning the session token.
async fn logged_in(router: &Router) -> String {
    let (status, _) = send(router, credentials("/api/account/register", "foo", "bar")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(router, credentials("/api/account/login", "foo", "bar")).await;
    assert_eq!(status, StatusCode::OK);
    body_to_json(&body)["token"].as_str().unwrap().to_owned()
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_returns_empty_ok() {
    let (router, _) = make_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/account/register")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=foo&password=bar"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn register_rejects_malformed_credentials() {
    let (router, _) = make_app();
    let (status, _) = send(&router, credentials("/api/account/register", "foo", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&router, credentials("/api/account/register", "f%20o", "bar")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_token_decodes_to_32_bytes() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    assert_eq!(STANDARD.decode(token).unwrap().len(), 32);
}

#[tokio::test]
async fn info_reports_latest_session_slot() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;

    let (status, body) = send(&router, get("/api/account/info", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let json = body_to_json(&body);
    assert_eq!(json["username"], "foo");
    assert_eq!(json["lastSessionSlot"], -1);

    let (status, _) = send(
        &router,
        post("/api/savedata/update?datatype=1&slot=3", &token, SESSION_BODY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, get("/api/account/info", Some(&token))).await;
    assert_eq!(body_to_json(&body)["lastSessionSlot"], 3);
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;

    let (status, body) = send(&router, get("/api/account/logout", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, _) = send(&router, get("/api/account/info", Some(&token))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn missing_or_malformed_token_is_400() {
    let (router, _) = make_app();
    let (status, _) = send(&router, get("/api/account/info", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let short = STANDARD.encode([7_u8; 16]);
    let (status, body) = send(&router, get("/api/savedata/get?datatype=0", Some(&short))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid token length: got 16, expected 32");
}

#[tokio::test]
async fn well_formed_token_for_unknown_account_is_500() {
    let (router, _) = make_app();
    let token = STANDARD.encode([42_u8; 32]);
    let (status, _) = send(&router, get("/api/savedata/get?datatype=0", Some(&token))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ---------------------------------------------------------------------------
// Save data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_update_without_datatype_is_empty_ok() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;

    let (status, body) = send(
        &router,
        post("/api/savedata/update?slot=2", &token, SESSION_BODY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, body) = send(
        &router,
        get("/api/savedata/get?datatype=1&slot=2", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = body_to_json(&body);
    assert_eq!(json["waveIndex"], 12);
    assert_eq!(json["party"], serde_json::json!([]));
}

#[tokio::test]
async fn system_flagged_update_with_session_body_is_400() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    let (status, _) = send(
        &router,
        post("/api/savedata/update?datatype=0", &token, SESSION_BODY),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn system_update_returns_no_body() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    let system = r#"{"trainerId":5,"secretId":6,"gameStats":{"battles":3},"dexData":{}}"#;

    let (status, body) = send(
        &router,
        post("/api/savedata/update?datatype=0", &token, system),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, body) = send(&router, get("/api/savedata/get?datatype=0", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body_to_json(&body)["trainerId"], 5);
}

#[tokio::test]
async fn repeated_get_is_idempotent() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    send(
        &router,
        post("/api/savedata/update?datatype=1", &token, SESSION_BODY),
    )
    .await;

    let (first_status, first) =
        send(&router, get("/api/savedata/get?datatype=1", Some(&token))).await;
    let (second_status, second) =
        send(&router, get("/api/savedata/get?datatype=1", Some(&token))).await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first_status, second_status);
    assert_eq!(first, second);
}

#[tokio::test]
async fn bad_save_parameters_are_400() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    for uri in [
        "/api/savedata/get?datatype=x",
        "/api/savedata/get?datatype=1&slot=x",
        "/api/savedata/delete?datatype=1.5",
    ] {
        let (status, _) = send(&router, get(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn absent_or_unknown_datatype_is_500() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    for (uri, text) in [
        ("/api/savedata/get", "invalid data type: -1"),
        ("/api/savedata/delete", "invalid data type: -1"),
        ("/api/savedata/get?datatype=9", "invalid data type: 9"),
        ("/api/savedata/delete?datatype=9&slot=1", "invalid data type: 9"),
    ] {
        let (status, body) = send(&router, get(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, text, "{uri}");
    }
}

#[tokio::test]
async fn out_of_range_slot_is_500() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    let (status, _) = send(
        &router,
        post("/api/savedata/update?datatype=1&slot=9", &token, SESSION_BODY),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn delete_removes_the_save() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;
    send(
        &router,
        post("/api/savedata/update?datatype=1&slot=1", &token, SESSION_BODY),
    )
    .await;

    let (status, body) = send(
        &router,
        get("/api/savedata/delete?datatype=1&slot=1", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (status, _) = send(
        &router,
        get("/api/savedata/get?datatype=1&slot=1", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn clear_is_always_session() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;

    let (status, body) = send(
        &router,
        post("/api/savedata/clear?datatype=0", &token, SESSION_BODY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body_to_json(&body), serde_json::json!({ "success": false }));

    let system = r#"{"trainerId":5,"secretId":6}"#;
    let (status, _) = send(&router, post("/api/savedata/clear", &token, system)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clearing_todays_daily_run_ranks_it() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;

    let (_, seed) = send(&router, get("/api/daily/seed", None)).await;
    let seed = String::from_utf8(seed.to_vec()).unwrap();
    let run = serde_json::json!({
        "seed": seed,
        "gameMode": 3,
        "waveIndex": 50,
        "score": 1234,
        "battleType": 2,
    })
    .to_string();

    let (status, body) = send(&router, post("/api/savedata/clear", &token, &run)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body_to_json(&body)["success"], true);

    let (status, body) = send(&router, get("/api/daily/rankings", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body_to_json(&body);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["username"], "foo");
    assert_eq!(entries[0]["score"], 1234);
    assert_eq!(entries[0]["wave"], 50);

    let (_, body) = send(&router, get("/api/daily/rankingpagecount?category=1", None)).await;
    assert_eq!(body, "1");
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn counters_are_served_from_the_registry() {
    let (router, state) = make_app();
    state.counters.store_snapshot(StatsSnapshot {
        player_count: 3,
        battle_count: 250,
        classic_session_count: 2,
    });

    let (status, body) = send(&router, get("/api/game/playercount", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "3");

    let (_, body) = send(&router, get("/api/game/classicsessioncount", None)).await;
    assert_eq!(body, "2");

    let (_, body) = send(&router, get("/api/game/titlestats", None)).await;
    assert_eq!(
        body_to_json(&body),
        serde_json::json!({ "playerCount": 3, "battleCount": 250 })
    );
}

// ---------------------------------------------------------------------------
// Daily
// ---------------------------------------------------------------------------

#[tokio::test]
async fn daily_seed_is_stable() {
    let (router, _) = make_app();
    let (status, first) = send(&router, get("/api/daily/seed", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!first.is_empty());
    let (_, second) = send(&router, get("/api/daily/seed", None)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn ranking_page_count_defaults_to_daily() {
    let (router, _) = make_app();
    let (status, body) = send(&router, get("/api/daily/rankingpagecount", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "0");
}

#[tokio::test]
async fn non_integer_ranking_params_are_400() {
    let (router, _) = make_app();
    let token = logged_in(&router).await;

    for uri in [
        "/api/daily/rankings?category=weekly",
        "/api/daily/rankings?page=two",
        "/api/daily/rankings?category=5",
    ] {
        let (status, _) = send(&router, get(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let (status, _) = send(&router, get("/api/daily/rankingpagecount?category=x", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unmatched_api_path_is_404() {
    let (router, _) = make_app();
    let (status, body) = send(&router, get("/api/savedata/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "not found");
}

#[tokio::test]
async fn missing_static_file_is_404() {
    let (router, _) = make_app();
    let (status, _) = send(&router, get("/index.html", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
