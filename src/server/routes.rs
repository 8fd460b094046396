//! REST command handlers.

use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{info, instrument};

use super::{AppState, ws};
use crate::matches::{Committed, Match, MatchError, MatchId};

/// Body of `POST /api/games`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
pub struct CreateMatchRequest {
    /// Label of the initiator.
    pub player: String,
    /// Play against the automated opponent.
    #[serde(default)]
    pub automated_opponent: bool,
}

/// Body of `POST /api/games/join`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
pub struct JoinMatchRequest {
    /// Match to join.
    pub match_id: MatchId,
    /// Label of the joining participant.
    pub player: String,
}

/// Body of `POST /api/games/move`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
pub struct MoveRequest {
    /// Match to play in.
    pub match_id: MatchId,
    /// Label of the acting participant.
    pub player: String,
    /// Square index, 0 (top-left) to 8 (bottom-right).
    pub position: i64,
}

/// Body of `GET /api/games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMatchesResponse {
    /// Matches waiting for a second participant.
    pub matches: Vec<MatchId>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/games", post(create_match).get(list_open_matches))
        .route("/api/games/join", post(join_match))
        .route("/api/games/state/{match_id}", get(get_match_state))
        .route("/api/games/move", post(make_move))
        .route("/ws", get(ws::upgrade))
        .layer(ServiceBuilder::new().map_request(|req: Request<axum::body::Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

#[instrument(skip(state))]
async fn create_match(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<Response, MatchError> {
    let committed = state
        .engine()
        .create(&req.player, req.automated_opponent)
        .await?;
    Ok(respond(StatusCode::CREATED, committed))
}

#[instrument(skip(state))]
async fn list_open_matches(
    State(state): State<AppState>,
) -> Result<Json<OpenMatchesResponse>, MatchError> {
    let matches = state.engine().list_open().await?;
    Ok(Json(OpenMatchesResponse { matches }))
}

#[instrument(skip(state))]
async fn join_match(
    State(state): State<AppState>,
    Json(req): Json<JoinMatchRequest>,
) -> Result<Response, MatchError> {
    let committed = state.engine().join(&req.match_id, &req.player).await?;
    Ok(respond(StatusCode::OK, committed))
}

#[instrument(skip(state))]
async fn get_match_state(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, MatchError> {
    let record = state.engine().get_state(&match_id).await?;
    Ok(Json(record))
}

#[instrument(skip(state))]
async fn make_move(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Response, MatchError> {
    // Negative positions are out of range too; the engine reports them in
    // its usual validation order.
    let position = usize::try_from(req.position).unwrap_or(usize::MAX);
    let committed = state
        .engine()
        .make_move(&req.match_id, &req.player, position)
        .await?;
    Ok(respond(StatusCode::OK, committed))
}

/// Renders the caller's response, then lets the command's events go out.
fn respond(status: StatusCode, committed: Committed<Match>) -> Response {
    let (record, publication) = committed.into_parts();
    let response = (status, Json(record)).into_response();
    publication.release();
    response
}
