#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bookshelf::{ServerConfig, create_app, db::Database};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const SECRET: &[u8] = b"test-signing-secret-that-is-long-enough";

/// Create a test app on a fresh in-memory database.
pub async fn create_test_app() -> (Router, Database) {
    create_app_with(false).await
}

/// Create a test app with token revocation enabled.
pub async fn create_test_app_with_revocation() -> (Router, Database) {
    create_app_with(true).await
}

async fn create_app_with(revocation: bool) -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: SECRET.to_vec(),
        revocation,
    };
    (create_app(&config), db)
}

/// Send a request and return the status with the parsed JSON body (Null when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register an account through the public endpoint and return its ID.
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/users",
        None,
        Some(json!({"name": name, "email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", json);
    json["id"].as_i64().unwrap()
}

/// Log in and return the session token.
pub async fn login(app: &Router, name: &str, password: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"name": name, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", json);
    json["message"].as_str().unwrap().to_string()
}

/// Register an account and log it in. Returns (id, token).
pub async fn register_and_login(app: &Router, name: &str, password: &str) -> (i64, String) {
    let email = format!("{}@mail.ru", name.to_lowercase());
    let id = register(app, name, &email, password).await;
    let token = login(app, name, password).await;
    (id, token)
}
