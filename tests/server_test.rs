//! HTTP tests driving the router in-process.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tictac_promo::{AppState, GameService, MAX_SESSION_ID_LEN, SqliteStore, WinLedger, router};
use tower::ServiceExt;

fn setup() -> (NamedTempFile, WinLedger, Router) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store =
        Arc::new(SqliteStore::open(db_path, Duration::from_secs(10)).expect("Failed to open store"));
    let ledger = WinLedger::new(store);
    let game = GameService::new(ledger.clone(), None);
    let app = router(AppState::new(game), &["http://localhost:5173".to_string()]);
    (db_file, ledger, app)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_winning_move_is_recorded() {
    let (_db, ledger, app) = setup();
    let (status, body) = post_json(
        &app,
        "/game/move",
        json!({ "sessionId": "s_deadbeef-0001", "board": [1, 2, 1, 2, 1, 0, 0, 0, 0], "cellIndex": 6 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["status"], json!("win"));
    assert_eq!(body["board"], json!([1, 2, 1, 2, 1, 0, 1, 0, 0]));
    assert!(ledger.has_win("s_deadbeef-0001").await);
}

#[tokio::test]
async fn test_ordinary_move_gets_an_answer() {
    let (_db, ledger, app) = setup();
    let (status, body) = post_json(
        &app,
        "/game/move",
        json!({ "sessionId": "s_deadbeef-0002", "board": [0, 0, 0, 0, 0, 0, 0, 0, 0], "cellIndex": 0 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("in_progress"));
    let board = body["board"].as_array().unwrap();
    assert_eq!(board[0], json!(1));
    assert_eq!(board.iter().filter(|c| **c == json!(2)).count(), 1);
    assert!(!ledger.has_win("s_deadbeef-0002").await);
}

#[tokio::test]
async fn test_short_board_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(
        &app,
        "/game/move",
        json!({ "board": [0, 0, 0], "cellIndex": 0 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_bad_cell_value_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, _) = post_json(
        &app,
        "/game/move",
        json!({ "board": [0, 0, 0, 0, 7, 0, 0, 0, 0], "cellIndex": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_occupied_cell_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(
        &app,
        "/game/move",
        json!({ "board": [1, 2, 0, 0, 0, 0, 0, 0, 0], "cellIndex": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_out_of_range_cell_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, _) = post_json(
        &app,
        "/game/move",
        json!({ "board": [0, 0, 0, 0, 0, 0, 0, 0, 0], "cellIndex": 9 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fractional_cell_index_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(
        &app,
        "/game/move",
        json!({ "board": [0, 0, 0, 0, 0, 0, 0, 0, 0], "cellIndex": 1.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_missing_cell_index_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(
        &app,
        "/game/move",
        json!({ "board": [0, 0, 0, 0, 0, 0, 0, 0, 0] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_board_that_is_not_an_array_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(&app, "/game/move", json!({ "board": "x", "cellIndex": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_malformed_session_report_is_rejected() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(&app, "/game/win", json!({ "sessionId": 42 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_overlong_session_id_is_rejected() {
    let (_db, _ledger, app) = setup();
    let session_id = "s".repeat(MAX_SESSION_ID_LEN + 1);
    let (status, _) = post_json(&app, "/game/win", json!({ "sessionId": session_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reported_win_is_recorded() {
    let (_db, ledger, app) = setup();
    let (status, body) = post_json(&app, "/game/win", json!({ "sessionId": "s_deadbeef-0003" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    assert!(ledger.has_win("s_deadbeef-0003").await);
}

#[tokio::test]
async fn test_win_without_session_still_succeeds() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(&app, "/game/win", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn test_reported_loss_is_acknowledged() {
    let (_db, _ledger, app) = setup();
    let (status, body) = post_json(&app, "/game/lose", json!({ "sessionId": "s_deadbeef-0004" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn test_health() {
    let (_db, _ledger, app) = setup();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "ok": true }));
}
