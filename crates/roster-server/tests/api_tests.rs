//! HTTP API tests over in-memory repositories

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common::{csv_file, InMemoryDb, InMemoryObjectStorage};
use roster_server::{api::create_router, features::FeatureState, models::AssignmentState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: &InMemoryDb) -> Router {
    create_router(FeatureState::new(db.repositories()))
}

async fn send(app: Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_without_database() {
    let db = InMemoryDb::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app(&db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Bulk
// ============================================================================

#[tokio::test]
async fn test_bulk_create_all_applied() {
    let db = InMemoryDb::new();
    let alice = db.add_user("alice");
    db.add_line_item("algebra");

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/bulk/assignments",
        json!({
            "operations": [
                {"identifier": "alice", "type": "create", "attributes": {"lineItemSlug": "algebra"}}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"data": {"applied": true, "results": {"alice": true}}}));
    assert_eq!(db.assignments_of(alice).len(), 1);
}

#[tokio::test]
async fn test_bulk_create_partial_failure() {
    let db = InMemoryDb::new();
    db.add_user("alice");
    db.add_line_item("algebra");

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/bulk/assignments",
        json!({
            "operations": [
                {"identifier": "alice", "type": "create", "attributes": {"lineItemSlug": "algebra"}},
                {"identifier": "ghost", "type": "create", "attributes": {"lineItemSlug": "algebra"}}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["data"]["applied"], json!(false));
    assert_eq!(body["data"]["results"], json!({"alice": true, "ghost": false}));
    assert_eq!(db.assignment_count(), 1);
}

#[tokio::test]
async fn test_bulk_dry_run_flag_applies_to_every_operation() {
    let db = InMemoryDb::new();
    db.add_user("alice");
    db.add_line_item("algebra");

    let (status, _) = send(
        app(&db),
        Method::POST,
        "/api/v1/bulk/assignments",
        json!({
            "dryRun": true,
            "operations": [
                {"identifier": "alice", "type": "create", "attributes": {"lineItemSlug": "algebra"}}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(db.assignment_count(), 0);
}

#[tokio::test]
async fn test_bulk_update_cancels() {
    let db = InMemoryDb::new();
    let alice = db.add_user("alice");
    let algebra = db.add_line_item("algebra");
    db.add_assignment(alice, algebra, AssignmentState::Started);

    let (status, body) = send(
        app(&db),
        Method::PATCH,
        "/api/v1/bulk/assignments",
        json!({
            "operations": [
                {"identifier": "alice", "type": "update", "attributes": {"state": "cancelled"}}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applied"], json!(true));
    assert_eq!(db.assignments_of(alice)[0].state, AssignmentState::Cancelled);
}

#[tokio::test]
async fn test_bulk_rejects_empty_operations() {
    let db = InMemoryDb::new();

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/bulk/assignments",
        json!({"operations": []}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn test_bulk_rejects_invalid_operation() {
    let db = InMemoryDb::new();

    let (status, _) = send(
        app(&db),
        Method::POST,
        "/api/v1/bulk/assignments",
        json!({"operations": [{"identifier": "", "type": "create", "attributes": {}}]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Ingest
// ============================================================================

#[tokio::test]
async fn test_ingest_defaults_to_dry_run() {
    let db = InMemoryDb::new();
    let file = csv_file("username,password\nalice,secret\nbob,hunter2\n");

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/ingest/user",
        json!({"path": file.path().to_str().unwrap()}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["type"], json!("user"));
    assert_eq!(body["data"]["rowCount"], json!(2));
    assert_eq!(body["data"]["dryRun"], json!(true));
    assert_eq!(
        body["meta"]["feedback"],
        json!("2 elements of type user have been ingested.")
    );
    assert!(db.store().users.is_empty());
}

#[tokio::test]
async fn test_ingest_reports_failures_with_line_numbers() {
    let db = InMemoryDb::new();
    let file = csv_file("slug;label;uri\nalgebra;Algebra;https://lti.example.org/algebra\nphysics;;x\n");

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/ingest/line-item",
        json!({"path": file.path().to_str().unwrap(), "delimiter": ";", "dryRun": false}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rowCount"], json!(1));
    assert_eq!(body["data"]["failures"][0]["lineNumber"], json!(3));
    assert_eq!(body["data"]["failures"][0]["data"]["slug"], json!("physics"));
    assert_eq!(db.store().line_item_inserts, vec![1]);
}

#[tokio::test]
async fn test_ingest_from_s3() {
    let db = InMemoryDb::new();
    let storage = InMemoryObjectStorage::default().with_object(
        InMemoryObjectStorage::BUCKET,
        "users.csv",
        "username,password\nalice,secret\n",
    );
    let app = create_router(
        FeatureState::new(db.repositories()).with_object_storage(Arc::new(storage)),
    );

    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/ingest/user",
        json!({"source": "s3", "path": "users.csv", "dryRun": false}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rowCount"], json!(1));
    assert_eq!(db.store().users.len(), 1);
}

#[tokio::test]
async fn test_ingest_unknown_user_is_unprocessable() {
    let db = InMemoryDb::new();
    db.add_line_item("algebra");
    let file = csv_file("username,lineItemSlug\nghost,algebra\n");

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/ingest/assignment",
        json!({"path": file.path().to_str().unwrap(), "dryRun": false}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert_eq!(db.assignment_count(), 0);
}

#[tokio::test]
async fn test_ingest_dry_run_rejects_unknown_user() {
    let db = InMemoryDb::new();
    db.add_line_item("algebra");
    let file = csv_file("username,lineItemSlug\nghost,algebra\n");

    let (status, body) = send(
        app(&db),
        Method::POST,
        "/api/v1/ingest/assignment",
        json!({"path": file.path().to_str().unwrap()}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], json!("User 'ghost' not found"));
}

#[tokio::test]
async fn test_ingest_error_statuses() {
    let db = InMemoryDb::new();

    let cases = [
        ("/api/v1/ingest/course", json!({"path": "x.csv"}), StatusCode::NOT_FOUND),
        (
            "/api/v1/ingest/user",
            json!({"path": "/nonexistent/roster/users.csv"}),
            StatusCode::NOT_FOUND,
        ),
        (
            "/api/v1/ingest/user",
            json!({"source": "s3", "path": "users.csv"}),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        (
            "/api/v1/ingest/user",
            json!({"source": "ftp", "path": "users.csv"}),
            StatusCode::BAD_REQUEST,
        ),
        (
            "/api/v1/ingest/user",
            json!({"path": "users.csv", "delimiter": ";;"}),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (uri, body, expected) in cases {
        let (status, _) = send(app(&db), Method::POST, uri, body).await;
        assert_eq!(status, expected, "{}", uri);
    }
}
