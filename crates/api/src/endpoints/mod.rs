//! API endpoints.

mod polls;
mod questions;
mod results;
mod vote;

use axum::Router;

use crate::middleware::AppState;

pub use polls::{PollDetailResponse, PollResponse};
pub use questions::{ChoiceResponse, QuestionResponse};
pub use results::{ResultAnswerResponse, ResultPollResponse, ResultResponse};
pub use vote::VoteResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/polls", polls::router())
        .nest("/polls/{poll_id}/questions", questions::router())
        .nest("/polls/{poll_id}/vote", vote::router())
        .nest("/results", results::router())
}
