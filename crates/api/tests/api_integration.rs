//! API integration tests.
//!
//! These tests drive the full router against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
use serde_json::Value;
use std::sync::Arc;
use survey_api::middleware::AppState;
use survey_core::{PollService, QuestionService, ResultsService, UserService, VoteService};
use survey_db::entities::{QuestionType, attempt, choice, poll, question, user};
use survey_db::repositories::{
    AttemptRepository, PollRepository, QuestionRepository, UserRepository,
};
use tower::{Layer, ServiceExt};
use tower_http::normalize_path::NormalizePathLayer;

/// Create test app state over a mock database.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let question_repo = QuestionRepository::new(Arc::clone(&db));
    let attempt_repo = AttemptRepository::new(Arc::clone(&db));

    AppState {
        user_service: UserService::new(user_repo),
        poll_service: PollService::new(poll_repo.clone(), question_repo.clone()),
        question_service: QuestionService::new(question_repo.clone(), poll_repo.clone()),
        vote_service: VoteService::new(poll_repo.clone()),
        results_service: ResultsService::new(attempt_repo, poll_repo, question_repo),
    }
}

fn create_test_app(db: DatabaseConnection) -> Router {
    survey_api::app(create_test_state(db))
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn test_poll(id: &str) -> poll::Model {
    poll::Model {
        id: id.to_string(),
        title: "Lunch".to_string(),
        description: Some("Where do we eat".to_string()),
        started_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        finished_at: None,
    }
}

fn test_user(id: &str, is_staff: bool) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        token: Some(format!("{id}-token")),
        is_staff,
        created_at: Utc::now().into(),
    }
}

fn single_choice_question(id: &str, poll_id: &str) -> question::Model {
    question::Model {
        id: id.to_string(),
        poll_id: poll_id.to_string(),
        position: 1,
        question_type: QuestionType::SingleChoice,
        main_text: "Pick one".to_string(),
    }
}

fn test_choice(id: &str, question_id: &str, text: &str) -> choice::Model {
    choice::Model {
        id: id.to_string(),
        question_id: question_id.to_string(),
        choice_text: text.to_string(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_list_polls_anonymous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_poll("poll1")]])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(Request::builder().uri("/polls").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["id"], "poll1");
    assert_eq!(body["data"][0]["started_at"], "2024-01-01");
    assert_eq!(body["data"][0]["finished_at"], Value::Null);
    assert_eq!(body["data"][0]["is_active"], true);
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<poll::Model>::new()])
        .into_connection();
    let app = NormalizePathLayer::trim_trailing_slash().layer(create_test_app(db));

    let response = app
        .oneshot(Request::builder().uri("/polls/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_poll_requires_auth() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(json_request(
            "POST",
            "/polls",
            &serde_json::json!({ "title": "Lunch" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_poll_forbidden_for_non_staff() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user("voter", false)]])
        .into_connection();
    let app = create_test_app(db);

    let mut request = json_request("POST", "/polls", &serde_json::json!({ "title": "Lunch" }));
    request
        .headers_mut()
        .insert("authorization", "Bearer voter-token".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .append_query_results([[test_poll("poll1")]])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/polls")
                .header("authorization", "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_lookup_failure_is_not_anonymous() {
    let anonymous = test_user("01J0ANON", false);
    let recorded = attempt::Model {
        id: "attempt1".to_string(),
        user_id: anonymous.id.clone(),
        poll_id: "poll1".to_string(),
        time: Utc::now().into(),
    };

    // Everything an anonymous vote would need is queued behind the failing lookup
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".to_string())])
        .append_query_results([[test_poll("poll1")]])
        .append_query_results([[single_choice_question("q1", "poll1")]])
        .append_query_results([[
            test_choice("c1", "q1", "Pizza"),
            test_choice("c2", "q1", "Sushi"),
        ]])
        .append_query_results([[anonymous]])
        .append_query_results([[recorded]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = create_test_app(db);

    let mut request = json_request(
        "POST",
        "/polls/poll1/vote",
        &serde_json::json!({ "answers": [{ "position": 1, "answer": ["Sushi"] }] }),
    );
    request
        .headers_mut()
        .insert("authorization", "Bearer voter-token".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn test_vote_rejects_invalid_answer() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_poll("poll1")]])
        .append_query_results([[single_choice_question("q1", "poll1")]])
        .append_query_results([[
            test_choice("c1", "q1", "Pizza"),
            test_choice("c2", "q1", "Sushi"),
        ]])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/polls/poll1/vote",
            &serde_json::json!({ "answers": [{ "position": 1, "answer": ["Tacos"] }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Question #1: invalid answer")
    );
}

#[tokio::test]
async fn test_vote_records_attempt_for_anonymous_voter() {
    let anonymous = test_user("01J0ANON", false);
    let recorded = attempt::Model {
        id: "attempt1".to_string(),
        user_id: anonymous.id.clone(),
        poll_id: "poll1".to_string(),
        time: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap().into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_poll("poll1")]])
        .append_query_results([[single_choice_question("q1", "poll1")]])
        .append_query_results([[
            test_choice("c1", "q1", "Pizza"),
            test_choice("c2", "q1", "Sushi"),
        ]])
        .append_query_results([[anonymous.clone()]])
        .append_query_results([[recorded]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/polls/poll1/vote",
            &serde_json::json!({ "answers": [{ "position": 1, "answer": ["Sushi"] }] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], "attempt1");
    assert_eq!(body["data"]["user"], "01J0ANON");
    assert_eq!(body["data"]["poll"], "poll1");
    assert_eq!(body["data"]["time"], "2024-06-01 12:30:00");
}

#[tokio::test]
async fn test_vote_on_missing_poll_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<poll::Model>::new()])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/polls/ghost/vote",
            &serde_json::json!({ "answers": [] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "POLL_NOT_FOUND");
}

#[tokio::test]
async fn test_results_without_user_returns_400() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(json_request("POST", "/results", &serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_results_for_unknown_user_is_empty() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<attempt::Model>::new()])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(json_request(
            "POST",
            "/results",
            &serde_json::json!({ "user": "ghost" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_questions_require_staff() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/polls/poll1/questions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_gets_question_by_position() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[test_user("admin", true)]])
        .append_query_results([[single_choice_question("q1", "poll1")]])
        .append_query_results([[
            test_choice("c1", "q1", "Pizza"),
            test_choice("c2", "q1", "Sushi"),
        ]])
        .into_connection();
    let app = create_test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/polls/poll1/questions/1")
                .header("authorization", "Bearer admin-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["position"], 1);
    assert_eq!(
        body["data"]["question_type"],
        "Ответ с выбором одного варианта"
    );
    assert_eq!(body["data"]["choices"][1]["choice_text"], "Sushi");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_app(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
