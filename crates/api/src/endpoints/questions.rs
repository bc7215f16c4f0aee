//! Question endpoints, addressed by position within a poll. Staff only.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use survey_common::AppResult;
use survey_core::{QuestionDraft, QuestionPatch, QuestionWithChoices};

use crate::{
    extractors::{AuthUser, require_staff},
    middleware::AppState,
    response::{self, ApiResponse},
};

/// Choice response.
#[derive(Debug, Serialize)]
pub struct ChoiceResponse {
    pub choice_text: String,
}

/// Question response. The type is rendered as its display label.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub position: i32,
    pub question_type: &'static str,
    pub main_text: String,
    pub choices: Vec<ChoiceResponse>,
}

impl From<QuestionWithChoices> for QuestionResponse {
    fn from(q: QuestionWithChoices) -> Self {
        Self {
            position: q.question.position,
            question_type: q.question.question_type.label(),
            main_text: q.question.main_text,
            choices: q
                .choices
                .into_iter()
                .map(|c| ChoiceResponse {
                    choice_text: c.choice_text,
                })
                .collect(),
        }
    }
}

/// List a poll's questions.
async fn list_questions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> AppResult<ApiResponse<Vec<QuestionResponse>>> {
    require_staff(&user)?;

    let questions = state.question_service.list(&poll_id).await?;
    Ok(ApiResponse::ok(
        questions.into_iter().map(QuestionResponse::from).collect(),
    ))
}

/// Add a question to a poll.
async fn create_question(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    Json(req): Json<QuestionDraft>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    require_staff(&user)?;

    let question = state.question_service.create(&poll_id, req).await?;
    Ok(ApiResponse::created(question.into()))
}

/// Get one question.
async fn get_question(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((poll_id, position)): Path<(String, i32)>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    require_staff(&user)?;

    let question = state.question_service.get(&poll_id, position).await?;
    Ok(ApiResponse::ok(question.into()))
}

/// Partially update a question.
async fn update_question(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((poll_id, position)): Path<(String, i32)>,
    Json(req): Json<QuestionPatch>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    require_staff(&user)?;

    let question = state
        .question_service
        .update(&poll_id, position, req)
        .await?;
    Ok(ApiResponse::ok(question.into()))
}

/// Delete a question.
async fn delete_question(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((poll_id, position)): Path<(String, i32)>,
) -> AppResult<impl IntoResponse> {
    require_staff(&user)?;

    state.question_service.delete(&poll_id, position).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route(
            "/{position}",
            get(get_question)
                .patch(update_question)
                .delete(delete_question),
        )
}
