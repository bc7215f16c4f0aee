//! HTTP API layer for survey-rs.
//!
//! - **Endpoints**: polls, questions, vote submission and results
//! - **Extractors**: optional and required authentication
//! - **Middleware**: bearer token resolution and shared state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;

/// Build the application router with authentication applied.
pub fn app(state: AppState) -> Router {
    router()
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
