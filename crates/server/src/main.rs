//! Survey-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{ServiceExt, extract::Request};
use survey_api::AppState;
use survey_common::Config;
use survey_core::{PollService, QuestionService, ResultsService, UserService, VoteService};
use survey_db::repositories::{
    AttemptRepository, PollRepository, QuestionRepository, UserRepository,
};
use tokio::signal;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting survey-rs server...");

    let config = Config::load()?;

    let db = Arc::new(survey_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    survey_db::migrate(&db).await?;
    info!("Migrations completed");

    let user_repo = UserRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let question_repo = QuestionRepository::new(Arc::clone(&db));
    let attempt_repo = AttemptRepository::new(Arc::clone(&db));

    let user_service = UserService::new(user_repo);
    if let Some(bootstrap) = &config.bootstrap {
        let staff = user_service
            .ensure_staff(&bootstrap.staff_username, &bootstrap.staff_token)
            .await?;
        info!(user_id = %staff.id, username = %staff.username, "Staff account ready");
    }

    let state = AppState {
        user_service,
        poll_service: PollService::new(poll_repo.clone(), question_repo.clone()),
        question_service: QuestionService::new(question_repo.clone(), poll_repo.clone()),
        vote_service: VoteService::new(poll_repo.clone()),
        results_service: ResultsService::new(attempt_repo, poll_repo, question_repo),
    };

    let app = survey_api::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    // Must wrap the router so paths are trimmed before route matching.
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
