//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use survey_common::AppError;
use survey_core::{PollService, QuestionService, ResultsService, UserService, VoteService};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub poll_service: PollService,
    pub question_service: QuestionService,
    pub vote_service: VoteService,
    pub results_service: ResultsService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the request
/// extensions. Unknown tokens leave the request anonymous; a failed lookup ends the
/// request with its error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => debug!("Bearer token rejected"),
            // A failed lookup never downgrades an identified caller to anonymous
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
