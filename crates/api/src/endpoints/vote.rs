//! Vote submission endpoint. Open to any caller.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::Serialize;
use survey_common::AppResult;
use survey_core::VoteInput;
use survey_db::entities::attempt;

use crate::{
    extractors::MaybeAuthUser,
    middleware::AppState,
    response::{ApiResponse, format_time},
};

/// Recorded attempt response.
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub id: String,
    pub user: String,
    pub poll: String,
    pub time: String,
}

impl From<attempt::Model> for VoteResponse {
    fn from(a: attempt::Model) -> Self {
        Self {
            time: format_time(&a.time),
            id: a.id,
            user: a.user_id,
            poll: a.poll_id,
        }
    }
}

/// Submit answers for every question of a poll.
async fn submit_vote(
    MaybeAuthUser(requester): MaybeAuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Json(req): Json<VoteInput>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let attempt = state
        .vote_service
        .submit(&poll_id, requester.as_ref(), req)
        .await?;
    Ok(ApiResponse::ok(attempt.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_vote))
}
