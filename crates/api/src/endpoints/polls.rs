//! Poll endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use survey_common::AppResult;
use survey_core::{CreatePollInput, PollDetail, UpdatePollInput};
use survey_db::entities::poll;

use super::questions::QuestionResponse;
use crate::{
    extractors::{AuthUser, MaybeAuthUser, require_staff},
    middleware::AppState,
    response::{self, ApiResponse, format_date},
};

/// Poll response.
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub is_active: bool,
}

impl From<poll::Model> for PollResponse {
    fn from(p: poll::Model) -> Self {
        Self {
            is_active: p.is_active(),
            id: p.id,
            title: p.title,
            description: p.description,
            started_at: format_date(p.started_at),
            finished_at: p.finished_at.map(format_date),
        }
    }
}

/// Poll detail response.
#[derive(Debug, Serialize)]
pub struct PollDetailResponse {
    #[serde(flatten)]
    pub poll: PollResponse,
    pub questions: Vec<QuestionResponse>,
}

impl From<PollDetail> for PollDetailResponse {
    fn from(detail: PollDetail) -> Self {
        Self {
            poll: detail.poll.into(),
            questions: detail
                .questions
                .into_iter()
                .map(QuestionResponse::from)
                .collect(),
        }
    }
}

/// List polls visible to the caller.
async fn list_polls(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PollResponse>>> {
    let polls = state.poll_service.list(viewer.is_staff()).await?;
    Ok(ApiResponse::ok(
        polls.into_iter().map(PollResponse::from).collect(),
    ))
}

/// Create a poll with its questions.
async fn create_poll(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePollInput>,
) -> AppResult<ApiResponse<PollDetailResponse>> {
    require_staff(&user)?;

    let detail = state.poll_service.create(req).await?;
    Ok(ApiResponse::created(detail.into()))
}

/// Get a poll with its questions.
async fn get_poll(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> AppResult<ApiResponse<PollDetailResponse>> {
    let detail = state
        .poll_service
        .get_detail(&poll_id, viewer.is_staff())
        .await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Partially update a poll.
async fn update_poll(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Json(req): Json<UpdatePollInput>,
) -> AppResult<ApiResponse<PollResponse>> {
    require_staff(&user)?;

    let poll = state.poll_service.update(&poll_id, req).await?;
    Ok(ApiResponse::ok(poll.into()))
}

/// Delete a poll.
async fn delete_poll(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_staff(&user)?;

    state.poll_service.delete(&poll_id).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_polls).post(create_poll))
        .route(
            "/{poll_id}",
            get(get_poll).patch(update_poll).delete(delete_poll),
        )
}
