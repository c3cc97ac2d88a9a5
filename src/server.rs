//! HTTP entry layer: request parsing, validation, and routing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tictac_engine::{GameStatus, MoveError};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};

use crate::GameService;

/// Longest accepted session id, in characters.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Shared state for handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    game: GameService,
}

impl AppState {
    /// Wraps the game service for the router.
    pub fn new(game: GameService) -> Self {
        Self { game }
    }
}

/// Body of `POST /game/move`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Correlates a win with a later reward claim.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Nine cells: 0 empty, 1 player, 2 opponent.
    pub board: Vec<i64>,
    /// Cell the player takes, 0-8.
    pub cell_index: i64,
}

/// Body of `POST /game/win` and `POST /game/lose`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Session the report belongs to.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response to a move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Always true on 200.
    pub success: bool,
    /// Status after the move.
    pub status: GameStatus,
    /// Board after the move.
    pub board: [u8; 9],
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always true on 200.
    pub success: bool,
}

/// Client-facing failure.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request; nothing happened.
    Validation(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                debug!(%message, "Rejecting request");
                let body = ErrorBody {
                    success: false,
                    message,
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(detail = %rejection.body_text(), "Unreadable request body");
        ApiError::Validation("request body is not valid JSON for this endpoint".to_string())
    }
}

impl From<MoveError> for ApiError {
    fn from(err: MoveError) -> Self {
        ApiError::Validation(err.kind.to_string())
    }
}

fn validate_session(session_id: Option<&str>) -> Result<Option<&str>, ApiError> {
    match session_id {
        Some(id) if id.is_empty() || id.chars().count() > MAX_SESSION_ID_LEN => Err(
            ApiError::Validation(format!(
                "sessionId must be 1..{} characters",
                MAX_SESSION_ID_LEN
            )),
        ),
        other => Ok(other),
    }
}

#[instrument(skip(state, payload))]
async fn play_move(
    State(state): State<AppState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    let Json(req) = payload?;
    debug!(cell_index = req.cell_index, "Move requested");
    let session_id = validate_session(req.session_id.as_deref())?;
    let outcome = state
        .game
        .play_move(session_id, &req.board, req.cell_index)
        .await?;
    Ok(Json(MoveResponse {
        success: true,
        status: outcome.status(),
        board: outcome.board().to_wire(),
    }))
}

#[instrument(skip(state, payload))]
async fn report_win(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    let session_id = validate_session(req.session_id.as_deref())?;
    state.game.report_win(session_id).await;
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state, payload))]
async fn report_lose(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    let session_id = validate_session(req.session_id.as_deref())?;
    state.game.report_lose(session_id);
    Ok(Json(SuccessResponse { success: true }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Builds the router with CORS limited to `allowed_origins`.
#[instrument(skip(state))]
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        warn!("No allowed origins; browsers will be refused");
    }
    info!(count = origins.len(), "CORS origins configured");

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/game/move", post(play_move))
        .route("/game/win", post(report_win))
        .route("/game/lose", post(report_lose))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
