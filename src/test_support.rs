//! Router-level test helpers shared by the route modules.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::db::models::{NewUser, User};
use crate::db::record::Lookup;
use crate::db::Store;
use crate::state::AppState;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Memory-backed state with a throttle loose enough for many logins per test.
pub fn test_state() -> AppState {
    let config = AppConfig {
        login_max_attempts: 1_000,
        ..AppConfig::default()
    };
    AppState::new(Store::memory(), config)
}

pub fn test_app(state: AppState) -> Router {
    crate::create_app(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 12345))))
}

/// Seed the admin user if needed and return a fresh bearer token.
pub async fn admin_token(state: &AppState, app: &Router) -> String {
    let existing = state
        .store
        .find::<User>(&Lookup::Unique(ADMIN_USERNAME.to_string()))
        .await
        .unwrap();
    if existing.is_none() {
        let user = NewUser {
            username: ADMIN_USERNAME.to_string(),
            password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).unwrap(),
            name: "Studio Admin".to_string(),
            role: "admin".to_string(),
        };
        state.store.insert(&user).await.unwrap();
    }

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Send a JSON request; an empty response body comes back as `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
