//! `/api/votes` handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;

use crate::http::response::rejection_to_vote_error;
use crate::http::server::AppState;
use crate::voting::{CreatePollRequest, PollView, VoteError, VoteResult};

#[derive(Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    pub service: &'static str,
    /// Epoch milliseconds, as a string.
    pub timestamp: String,
}

fn parse_id(raw: &str, what: &str) -> VoteResult<u64> {
    raw.parse()
        .map_err(|_| VoteError::Validation(format!("{what} id must be a positive integer, got {raw:?}")))
}

pub async fn health() -> Json<ServiceHealth> {
    Json(ServiceHealth {
        status: "UP",
        service: "voting-system",
        timestamp: chrono::Utc::now().timestamp_millis().to_string(),
    })
}

pub async fn list_polls(State(state): State<AppState>) -> Json<Vec<PollView>> {
    Json(state.votes.list_polls())
}

pub async fn list_active_polls(State(state): State<AppState>) -> Json<Vec<PollView>> {
    Json(state.votes.list_active_polls())
}

/// Unknown or malformed ids yield `null`.
pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Json<Option<PollView>> {
    let poll = poll_id.parse().ok().and_then(|id| state.votes.get_poll(id));
    Json(poll)
}

pub async fn create_poll(
    State(state): State<AppState>,
    body: Result<Json<CreatePollRequest>, JsonRejection>,
) -> VoteResult<Json<PollView>> {
    let Json(request) = body.map_err(rejection_to_vote_error)?;
    state.votes.create_poll(request).map(Json)
}

pub async fn cast_vote(
    State(state): State<AppState>,
    Path((poll_id, option_id)): Path<(String, String)>,
) -> VoteResult<Json<PollView>> {
    let poll_id = parse_id(&poll_id, "poll")?;
    let option_id = parse_id(&option_id, "option")?;
    state.votes.cast_vote(poll_id, option_id).map(Json)
}

pub async fn deactivate_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> VoteResult<Json<PollView>> {
    let poll_id = parse_id(&poll_id, "poll")?;
    state.votes.deactivate_poll(poll_id).map(Json)
}
