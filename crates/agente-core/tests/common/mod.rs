//! Common Test Utilities for Integration Tests
//!
//! A mock dashboard backend served by axum on an ephemeral port, plus a
//! navigator that counts login redirects.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agente_core::{Config, Navigator, SessionStorage, SessionStore};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@x.com";
pub const STALE_EMAIL: &str = "stale@x.com";
pub const TAKEN_EMAIL: &str = "taken@x.com";
pub const PASSWORD: &str = "secret";
pub const VALID_TOKEN: &str = "abc123";
pub const EXPIRED_TOKEN: &str = "expired-token";

#[derive(Default)]
pub struct CountingNavigator {
    count: AtomicUsize,
}

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn navigate_to_login(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct MockState {
    rate_limited_calls: Arc<AtomicUsize>,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if password != PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "Credenciais inválidas");
    }

    let token = if email == STALE_EMAIL { EXPIRED_TOKEN } else { VALID_TOKEN };
    Json(json!({
        "ok": true,
        "access_token": token,
        "token_type": "bearer",
        "user": { "id": 1, "email": email, "name": "Admin", "is_active": true }
    }))
    .into_response()
}

async fn signup(Json(body): Json<Value>) -> Response {
    if body["email"] == TAKEN_EMAIL {
        return detail(StatusCode::CONFLICT, "Email já cadastrado");
    }
    (
        StatusCode::CREATED,
        Json(json!({ "ok": true, "message": "Usuário criado com sucesso" })),
    )
        .into_response()
}

async fn me(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(VALID_TOKEN) => Json(json!({
            "authenticated": true,
            "user_id": 1,
            "user_email": ADMIN_EMAIL,
            "user_name": "Admin",
            "role": "admin"
        }))
        .into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Token inválido ou expirado"),
    }
}

async fn expired() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Token inválido ou expirado")
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    Json(json!({ "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()) }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({ "ok": true }))
}

async fn rate_limited(State(state): State<MockState>) -> Response {
    if state.rate_limited_calls.fetch_add(1, Ordering::SeqCst) == 0 {
        return detail(StatusCode::TOO_MANY_REQUESTS, "slow down");
    }
    Json(json!({ "ok": true })).into_response()
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn mock_app() -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/me", get(me))
        .route("/kpis", get(expired))
        .route("/echo-auth", get(echo_auth))
        .route("/slow", get(slow))
        .route("/limited", get(rate_limited))
        .route("/followups/1", axum::routing::delete(no_content));

    Router::new()
        .nest("/api", api)
        .with_state(MockState::default())
}

/// Serve the mock backend on an ephemeral port
pub async fn spawn_backend() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, mock_app()).await.unwrap();
    });

    addr
}

pub fn test_config(addr: SocketAddr) -> Config {
    Config {
        api_base_url: format!("http://{}/api", addr),
        request_timeout_secs: 1,
        initial_backoff_ms: 1,
        ..Config::default()
    }
}

pub fn store_with(
    config: &Config,
    storage: Arc<dyn SessionStorage>,
) -> (SessionStore, Arc<CountingNavigator>) {
    let navigator = Arc::new(CountingNavigator::default());
    let store = SessionStore::new(config, storage, navigator.clone()).unwrap();
    (store, navigator)
}
