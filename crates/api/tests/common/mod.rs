#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use authd_api::auth::{AuthService, AuthSettings};
use authd_api::config::{ServerConfig, StoreBackend};
use authd_api::state::AppState;
use authd_core::clock::ManualClock;
use authd_core::password::Argon2Hasher;
use authd_core::token::{HmacAlgorithm, TokenCodec, TokenConfig};
use authd_core::validation::SignUpInput;
use authd_db::MemoryStore;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const TEST_SALT: &str = "c2FsdHNhbHRzYWx0c2FsdA";

/// Peer address attached to every test request.
pub const PEER: &str = "203.0.113.9:52100";

/// Everything a test needs to drive the service and inspect the store.
pub struct TestHarness {
    pub service: Arc<AuthService>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: ServerConfig,
}

pub fn token_config() -> TokenConfig {
    TokenConfig {
        signing_key: "integration-test-signing-key".to_string(),
        issuer: "authd".to_string(),
        audience: "authd".to_string(),
        algorithm: HmacAlgorithm::HS256,
        access_token_ttl_mins: 15,
        refresh_token_ttl_hours: 720,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store: StoreBackend::Memory,
        auth: AuthSettings::default(),
        token: token_config(),
        password_salt: TEST_SALT.to_string(),
        password_pepper: None,
    }
}

/// An auth service over a fresh in-memory store and a manual clock. The
/// hasher uses minimal Argon2 cost so tests stay fast.
pub fn harness() -> TestHarness {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let hasher = Argon2Hasher::new(&config.password_salt, None)
        .and_then(|h| h.with_cost(8, 1, 1))
        .expect("test hasher config should be valid");
    let codec = TokenCodec::new(&config.token, clock.clone());
    let service = AuthService::new(
        store.clone(),
        Arc::new(hasher),
        codec,
        config.auth.clone(),
        clock.clone(),
    );

    TestHarness {
        service: Arc::new(service),
        store,
        clock,
        config,
    }
}

/// Build the full application router on top of `harness`.
pub fn build_test_app(harness: &TestHarness) -> Router {
    let state = AppState {
        auth: Arc::clone(&harness.service),
        store: harness.store.clone(),
        config: Arc::new(harness.config.clone()),
    };
    authd_api::app::build(state)
}

pub fn sign_up_input(username: &str, password: &str) -> SignUpInput {
    SignUpInput {
        username: username.to_string(),
        email: Some(format!("{username}@test.com")),
        password: password.to_string(),
        avatar_id: None,
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

fn with_peer(mut request: Request<Body>) -> Request<Body> {
    let peer: SocketAddr = PEER.parse().expect("valid peer address");
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(with_peer(request))
        .await
        .expect("router should not fail")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
