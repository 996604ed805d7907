//! API integration tests.
//!
//! These tests drive the router end to end with a mock database,
//! verifying the gateway identity contract and the response envelope.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use contentplan_api::middleware::{AppState, USER_ID_HEADER, identity_middleware};
use contentplan_api::router as api_router;
use contentplan_core::{ApprovalService, NotificationDispatcher, PlanService};
use contentplan_db::repositories::{
    NotificationRepository, PlanRepository, PostRepository, TeamMemberRepository,
};
use maplit::btreemap;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Build the full app around a prepared mock connection.
fn test_app(db: DatabaseConnection) -> Router {
    let db = Arc::new(db);

    let plan_repo = PlanRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let team_member_repo = TeamMemberRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    let notification_dispatcher = NotificationDispatcher::new(notification_repo);
    let plan_service = PlanService::new(
        plan_repo.clone(),
        post_repo.clone(),
        team_member_repo.clone(),
        notification_dispatcher.clone(),
    );
    let approval_service = ApprovalService::new(
        plan_repo,
        post_repo,
        team_member_repo,
        notification_dispatcher.clone(),
    );

    let state = AppState {
        plan_service,
        approval_service,
        notification_dispatcher,
    };

    Router::new()
        .nest("/api", api_router().with_state(state))
        .layer(axum::middleware::from_fn(identity_middleware))
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
    btreemap! { "num_items" => Value::BigInt(Some(n)) }
}

#[tokio::test]
async fn test_request_without_identity_header_is_unauthorized() {
    let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/notifications/unread-count")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_blank_identity_header_is_unauthorized() {
    let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/notifications/unread-count")
                .header(USER_ID_HEADER, "   ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unread_count_returns_envelope_with_data() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(3)]])
        .into_connection();
    let app = test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/notifications/unread-count")
                .header(USER_ID_HEADER, "user1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["data"]["count"], 3);
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/unknown")
                .header(USER_ID_HEADER, "user1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
