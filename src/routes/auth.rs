//! Admin session authentication.
//!
//! Login exchanges a username/password for an opaque bearer token. Only the
//! SHA-256 digest of the token is persisted, as the session id.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::crud::{accept, Deleted};
use crate::db::models::{NewUser, Session, SessionData, User};
use crate::db::record::Lookup;
use crate::error::{AppError, FieldError};
use crate::extract::Payload;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "invalid username or password";

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: String,
}

impl From<&SessionData> for UserInfo {
    fn from(data: &SessionData) -> Self {
        Self {
            id: data.user_id,
            username: data.username.clone(),
            name: data.name.clone(),
            role: data.role.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

/// A verified admin session, available to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub sid: String,
    pub user: SessionData,
    pub expires_at: DateTime<Utc>,
}

fn generate_token() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 64)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer token in `headers` to a live session.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AdminSession, AppError> {
    let token = extract_bearer_token(headers)
        .ok_or(AppError::Unauthorized("missing bearer token"))?;
    let sid = hash_token(token);
    let session = state
        .store
        .find_session(&sid)
        .await?
        .ok_or(AppError::Unauthorized("session is invalid or expired"))?;

    Ok(AdminSession {
        sid: session.sid,
        user: session.sess.0,
        expires_at: session.expire,
    })
}

/// Middleware for the admin router: nothing behind it runs without a session.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<AdminSession>() {
            return Ok(session.clone());
        }
        authenticate(state, &parts.headers).await
    }
}

async fn check_password(password: String, password_hash: String) -> Result<bool, AppError> {
    // bcrypt is deliberately slow; keep it off the async workers.
    match tokio::task::spawn_blocking(move || verify(password, &password_hash)).await {
        Ok(Ok(valid)) => Ok(valid),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            Ok(false)
        }
        Err(e) => Err(AppError::Internal(format!("password check panicked: {}", e))),
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Payload(body): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let ip = addr.ip().to_string();
    if !state.throttle.allow(&ip).await {
        tracing::warn!(ip = %ip, "login throttled");
        return Err(AppError::TooManyRequests);
    }

    let username = body.username.trim();
    let mut missing = Vec::new();
    if username.is_empty() {
        missing.push(FieldError::new("username", "is required"));
    }
    if body.password.is_empty() {
        missing.push(FieldError::new("password", "is required"));
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(missing));
    }

    let user = state
        .store
        .find::<User>(&Lookup::Unique(username.to_string()))
        .await?;
    let Some(user) = user else {
        tracing::info!(ip = %ip, username, "login rejected: unknown user");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };
    if !check_password(body.password, user.password_hash.clone()).await? {
        tracing::info!(ip = %ip, username, "login rejected: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    state.throttle.reset(&ip).await;
    match state.store.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => tracing::debug!(purged, "expired sessions removed"),
        Err(e) => tracing::warn!(error = %e, "could not purge expired sessions"),
    }

    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(state.config.session_ttl_hours);
    let data = SessionData {
        user_id: user.id,
        username: user.username,
        name: user.name,
        role: user.role,
    };
    state
        .store
        .create_session(&Session {
            sid: hash_token(&token),
            sess: sqlx::types::Json(data.clone()),
            expire: expires_at,
        })
        .await?;

    tracing::info!(user_id = data.user_id, username = %data.username, "admin logged in");
    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: UserInfo::from(&data),
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<Deleted>, AppError> {
    state.store.delete_session(&session.sid).await?;
    tracing::info!(username = %session.user.username, "admin logged out");
    Ok(Json(Deleted { success: true }))
}

/// GET /api/auth/me
pub async fn me(session: AdminSession) -> Json<UserInfo> {
    Json(UserInfo::from(&session.user))
}

/// Create the configured admin when no user exists yet.
pub async fn bootstrap_admin(state: &AppState) -> Result<(), AppError> {
    let Some(seed) = state.config.admin.clone() else {
        return Ok(());
    };
    if state.store.count::<User>().await? > 0 {
        return Ok(());
    }

    let password_hash = match (seed.password_hash, seed.password) {
        (Some(hashed), _) => hashed,
        (None, Some(plain)) => tokio::task::spawn_blocking(move || hash(plain, DEFAULT_COST))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing panicked: {}", e)))?
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?,
        (None, None) => {
            tracing::warn!(username = %seed.username, "admin seed has no password; skipped");
            return Ok(());
        }
    };

    let user = accept(NewUser {
        username: seed.username,
        password_hash,
        name: seed.name,
        role: "admin".to_string(),
    })?;
    let created = state.store.insert(&user).await?;
    tracing::info!(user_id = created.id, username = %created.username, "initial admin created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::config::{AdminSeed, AppConfig};
    use crate::db::Store;
    use crate::test_support::{admin_token, send, test_app, test_state, ADMIN_PASSWORD, ADMIN_USERNAME};

    #[test]
    fn test_token_shape_and_digest() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        let digest = hash_token(&token);
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, token);
        assert_eq!(digest, hash_token(&token));
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());
        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_none());
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let state = test_state();
        let app = test_app(state.clone());
        admin_token(&state, &app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": ADMIN_USERNAME, "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let app = test_app(test_state());
        let (status, body) = send(&app, Method::POST, "/api/auth/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "username");
        assert_eq!(body["error"]["details"][1]["field"], "password");
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], ADMIN_USERNAME);

        let (status, _) = send(&app, Method::GET, "/api/admin/slides", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = send(&app, Method::GET, "/api/admin/slides", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = "expired-token-value";
        state
            .store
            .create_session(&Session {
                sid: hash_token(token),
                sess: sqlx::types::Json(SessionData {
                    user_id: 1,
                    username: "ghost".to_string(),
                    name: "Ghost".to_string(),
                    role: "admin".to_string(),
                }),
                expire: Utc::now() - Duration::minutes(1),
            })
            .await
            .unwrap();

        let (status, _) = send(&app, Method::GET, "/api/admin/slides", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mutation_without_token_writes_nothing() {
        let state = test_state();
        let app = test_app(state.clone());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/slides",
            None,
            Some(json!({ "title": "Sneaky", "imageUrl": "/x.jpg" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::DELETE,
            "/api/admin/slides/1",
            Some("not-a-real-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, list) = send(&app, Method::GET, "/api/slides", None, None).await;
        assert_eq!(list["count"], 0);
    }

    #[tokio::test]
    async fn test_login_is_throttled_per_ip() {
        let config = AppConfig {
            login_max_attempts: 2,
            ..AppConfig::default()
        };
        let state = AppState::new(Store::memory(), config);
        let app = test_app(state);
        let attempt = json!({ "username": "nobody", "password": "guess" });

        for _ in 0..2 {
            let (status, _) =
                send(&app, Method::POST, "/api/auth/login", None, Some(attempt.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        let (status, body) = send(&app, Method::POST, "/api/auth/login", None, Some(attempt)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "rate_limited");
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin_once() {
        let config = AppConfig {
            admin: Some(AdminSeed {
                username: "owner".to_string(),
                name: "Owner".to_string(),
                password: None,
                password_hash: Some(bcrypt::hash(ADMIN_PASSWORD, 4).unwrap()),
            }),
            ..AppConfig::default()
        };
        let state = AppState::new(Store::memory(), config);
        bootstrap_admin(&state).await.unwrap();
        bootstrap_admin(&state).await.unwrap();
        assert_eq!(state.store.count::<User>().await.unwrap(), 1);

        let app = test_app(state);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "owner", "password": ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(body["token"].as_str().unwrap().len(), 64);
    }
}
