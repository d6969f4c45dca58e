use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use uuid::Uuid;

use orderq_orders::router::build_router;
use orderq_orders::state::AppState;
use orderq_orders_schema::orders;

fn model(order_id: &str, customer: &str) -> orders::Model {
    orders::Model {
        id: Uuid::now_v7(),
        order_id: order_id.to_owned(),
        customer: customer.to_owned(),
        total: Decimal::new(19999, 2),
        status: orders::OrderStatus::Pending,
        attempts: 0,
        locked_at: None,
        last_error: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

fn server(db: DatabaseConnection) -> TestServer {
    TestServer::new(build_router(AppState {
        db: db.into(),
        max_attempts: 3,
    }))
    .unwrap()
}

#[tokio::test]
async fn should_create_order_and_return_201() {
    let row = model("ORD-1", "Alice");
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_query_results([[row.clone()]])
            .into_connection(),
    );

    let response = server
        .post("/orders")
        .json(&json!({ "order_id": "ORD-1", "customer": "Alice", "total": 199.99 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], row.id.to_string());
    assert_eq!(body["order_id"], "ORD-1");
    assert_eq!(body["customer"], "Alice");
    assert_eq!(body["total"], "199.99");
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["attempts"], 0);
    assert!(body["locked_at"].is_null());
    assert!(body["last_error"].is_null());
    assert_eq!(body["created_at"], "2024-01-01T00:00:00.000Z");
}

#[tokio::test]
async fn should_answer_duplicate_submission_like_a_fresh_one() {
    let existing = model("ORD-1", "Alice");
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .append_query_results([[existing.clone()]])
            .into_connection(),
    );

    let response = server
        .post("/orders")
        .json(&json!({ "order_id": "ORD-1", "customer": "Bob", "total": "50.00" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], existing.id.to_string());
    assert_eq!(body["customer"], "Alice");
}

#[tokio::test]
async fn should_reject_blank_order_id() {
    let server = server(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = server
        .post("/orders")
        .json(&json!({ "order_id": "  ", "customer": "Alice", "total": 1 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ORDER");
}

#[tokio::test]
async fn should_return_500_on_storage_failure() {
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([sea_orm::DbErr::Custom("connection reset".into())])
            .into_connection(),
    );

    let response = server
        .post("/orders")
        .json(&json!({ "order_id": "ORD-1", "customer": "Alice", "total": 1 }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INTERNAL");
    assert_eq!(body["message"], "internal error");
}

#[tokio::test]
async fn should_get_order_by_natural_key() {
    let mut row = model("ORD-7", "Carol");
    row.attempts = 2;
    row.last_error = Some("timeout".into());
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection(),
    );

    let response = server.get("/orders/ORD-7").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["order_id"], "ORD-7");
    assert_eq!(body["attempts"], 2);
    assert_eq!(body["last_error"], "timeout");
}

#[tokio::test]
async fn should_return_404_for_unknown_order() {
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<orders::Model>::new()])
            .into_connection(),
    );

    let response = server.get("/orders/ORD-404").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn should_list_pending_pool() {
    let server = server(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[model("ORD-1", "Alice"), model("ORD-2", "Bob")]])
            .into_connection(),
    );

    let response = server
        .get("/orders/pending")
        .add_query_param("limit", 2)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_id"].as_str().unwrap())
        .collect();
    assert_eq!(keys, ["ORD-1", "ORD-2"]);
}

#[tokio::test]
async fn should_pass_max_attempts_to_pending_query() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<orders::Model>::new()])
            .into_connection(),
    );
    let server = TestServer::new(build_router(AppState {
        db: Arc::clone(&db),
        max_attempts: 3,
    }))
    .unwrap();

    let response = server
        .get("/orders/pending")
        .add_query_param("limit", 5)
        .add_query_param("max_attempts", 1)
        .await;

    response.assert_status_ok();
    drop(server);
    let Ok(db) = Arc::try_unwrap(db) else {
        panic!("connection still shared");
    };
    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("Int(Some(1))"), "caller ceiling not applied: {log}");
    assert!(!log.contains("Int(Some(3))"), "configured ceiling used instead: {log}");
}

#[tokio::test]
async fn should_return_empty_page_for_zero_limit() {
    let server = server(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = server
        .get("/orders/pending")
        .add_query_param("limit", 0)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn should_reject_order_id_shadowed_by_pending_route() {
    let server = server(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = server
        .post("/orders")
        .json(&json!({ "order_id": "pending", "customer": "Alice", "total": 1 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "INVALID_ORDER");
}

#[tokio::test]
async fn should_answer_liveness_and_tag_request_id() {
    let server = server(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    assert!(!response.header("x-request-id").is_empty());
}
