//! Results endpoint: past attempts of a user.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use survey_common::{AppError, AppResult};
use survey_core::{AnswerDetail, AttemptDetail};
use survey_db::entities::poll;

use super::questions::QuestionResponse;
use crate::{
    middleware::AppState,
    response::{ApiResponse, format_date, format_time},
};

/// Results request.
#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    #[serde(default)]
    pub user: Option<String>,
}

/// Poll as embedded in a result.
#[derive(Debug, Serialize)]
pub struct ResultPollResponse {
    pub title: String,
    pub description: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl From<poll::Model> for ResultPollResponse {
    fn from(p: poll::Model) -> Self {
        Self {
            title: p.title,
            description: p.description,
            started_at: format_date(p.started_at),
            finished_at: p.finished_at.map(format_date),
        }
    }
}

/// Answer as embedded in a result.
#[derive(Debug, Serialize)]
pub struct ResultAnswerResponse {
    pub question: QuestionResponse,
    pub answer: String,
}

impl From<AnswerDetail> for ResultAnswerResponse {
    fn from(a: AnswerDetail) -> Self {
        Self {
            question: a.question.into(),
            answer: a.answer,
        }
    }
}

/// One attempt with its poll and answers.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub user: String,
    pub time: String,
    pub poll: ResultPollResponse,
    pub answers: Vec<ResultAnswerResponse>,
}

impl From<AttemptDetail> for ResultResponse {
    fn from(d: AttemptDetail) -> Self {
        Self {
            user: d.attempt.user_id,
            time: format_time(&d.attempt.time),
            poll: d.poll.into(),
            answers: d.answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// List a user's attempts, most recent first.
async fn list_results(
    State(state): State<AppState>,
    Json(req): Json<ResultsRequest>,
) -> AppResult<ApiResponse<Vec<ResultResponse>>> {
    let user_id = req
        .user
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("User id is required".to_string()))?;

    let attempts = state.results_service.attempts_for_user(&user_id).await?;
    Ok(ApiResponse::ok(
        attempts.into_iter().map(ResultResponse::from).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(list_results))
}
