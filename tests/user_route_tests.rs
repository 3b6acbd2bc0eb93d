use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use roster::config::Config;
use roster::db::{SEED_USERS, UserStore};
use roster::server::router::{RosterState, roster_router};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

/// Router over a seeded per-test temp database.
async fn seeded_app(tag: &str) -> Router {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = std::env::temp_dir();
    path.push(format!(
        "roster-routes-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let cfg = Config {
        database_url: format!("sqlite:{}", path.display()),
        ..Config::default()
    };

    let store = UserStore::connect(&cfg).await.expect("connect failed");
    store.ensure_schema().await;
    store.seed(SEED_USERS).await;

    roster_router(RosterState::new(store))
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not valid JSON")
}

#[tokio::test]
async fn list_users_returns_seeded_rows_with_total() {
    let app = seeded_app("list").await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 3);
    assert_eq!(body["data"][0]["email"], "joao@example.com");
    assert_eq!(body["data"][0]["name"], "João Silva");
}

#[tokio::test]
async fn status_route_reports_count_and_backend_time() {
    let app = seeded_app("status").await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users/status")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_users"], 3);
    assert!(body["data"]["current_time"].is_string());
}

#[tokio::test]
async fn lookup_by_email_hits_and_misses() {
    let app = seeded_app("lookup").await;

    // 1. Known email -> 200 with the row.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users/maria@example.com")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["data"]["name"], "Maria Santos");

    // 2. Unknown email -> 404 with the error envelope.
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users/missing@example.com")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn create_route_maps_outcomes_to_status_codes() {
    let app = seeded_app("create").await;

    // 1. New email -> 201 with the persisted view.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"name":"Ana","email":"ana@example.com"}"#,
                ))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["id"].as_i64().unwrap() > 0);
    assert!(body["data"]["created_at"].is_string());
    assert_eq!(body["message"], "User created successfully");

    // 2. Duplicate email -> 409.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"name":"Other Ana","email":"ana@example.com"}"#,
                ))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // 3. Empty name -> 422.
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"","email":"new@example.com"}"#))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}
