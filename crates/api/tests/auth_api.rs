//! HTTP-level integration tests for the `/auth` and `/account` endpoints.

mod common;

use authd_db::models::session_history::UNKNOWN_APP_ID;
use authd_db::AuthStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, get_auth, harness, post_auth, post_json, send};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn sign_up(app: axum::Router, username: &str, password: &str) -> serde_json::Value {
    let body = json!({ "username": username, "email": format!("{username}@test.com"), "password": password });
    let response = post_json(app, "/auth/sign-up", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Sign in through the API with the given client headers and return the
/// token pair.
async fn sign_in(
    app: axum::Router,
    username: &str,
    password: &str,
    headers: &[(&str, &str)],
) -> serde_json::Value {
    let mut request = Request::post("/auth/sign-in").header("content-type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let body = json!({ "username": username, "password": password });
    let response = send(app, request.body(Body::from(body.to_string())).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn token<'a>(pair: &'a serde_json::Value, field: &str) -> &'a str {
    pair[field].as_str().expect("token field should be a string")
}

// ---------------------------------------------------------------------------
// Sign-up
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_up_returns_the_new_id() {
    let h = harness();
    let json = sign_up(build_test_app(&h), "alice", "pw1").await;
    assert_eq!(json["id"], 1);
}

#[tokio::test]
async fn duplicate_username_returns_409() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;

    let body = json!({ "username": "alice", "password": "pw2" });
    let response = post_json(build_test_app(&h), "/auth/sign-up", body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_USERNAME");
}

#[tokio::test]
async fn sign_up_with_missing_fields_is_a_validation_error() {
    let h = harness();

    let response = post_json(build_test_app(&h), "/auth/sign-up", json!({ "username": "alice" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let body = json!({ "username": "alice", "password": "pw1", "email": "nope" });
    let response = post_json(build_test_app(&h), "/auth/sign-up", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Invalid fields: email");
}

// ---------------------------------------------------------------------------
// Sign-in and identity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_password_returns_401() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;

    let body = json!({ "username": "alice", "password": "wrong" });
    let response = post_json(build_test_app(&h), "/auth/sign-in", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
    assert_eq!(json["error"], "Invalid username or password");
}

#[tokio::test]
async fn non_numeric_app_id_falls_back_to_unknown_application() {
    let h = harness();
    let user = sign_up(build_test_app(&h), "alice", "pw1").await;
    let user_id = user["id"].as_i64().expect("id should be a number");

    let pair = sign_in(build_test_app(&h), "alice", "pw1", &[("app_id", "web")]).await;
    assert!(pair["access_token"].is_string());

    let history = h.store.get_session_history_by_user(user_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].app_id, UNKNOWN_APP_ID);
}

#[tokio::test]
async fn sign_in_then_identity_is_granted() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;
    let pair = sign_in(build_test_app(&h), "alice", "pw1", &[]).await;

    assert_eq!(pair["expires_in"], 900);

    let response = post_auth(build_test_app(&h), "/auth/identity", token(&pair, "access_token")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "access granted");
}

#[tokio::test]
async fn identity_requires_exact_bearer_header() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;
    let pair = sign_in(build_test_app(&h), "alice", "pw1", &[]).await;

    let request = Request::post("/auth/identity")
        .header("authorization", format!("Token {}", token(&pair, "access_token")))
        .body(Body::empty())
        .unwrap();
    let response = send(build_test_app(&h), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");

    let request = Request::post("/auth/identity").body(Body::empty()).unwrap();
    let response = send(build_test_app(&h), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;
    let pair = sign_in(build_test_app(&h), "alice", "pw1", &[]).await;

    let response = post_auth(build_test_app(&h), "/auth/identity", token(&pair, "refresh_token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_rotates_and_detects_reuse() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;
    let first = sign_in(build_test_app(&h), "alice", "pw1", &[]).await;

    let response = post_auth(build_test_app(&h), "/auth/refresh-token", token(&first, "refresh_token")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_ne!(second["refresh_token"], first["refresh_token"]);

    let response = post_auth(build_test_app(&h), "/auth/refresh-token", token(&first, "refresh_token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_REUSE_DETECTED");

    let response = post_auth(build_test_app(&h), "/auth/identity", token(&second, "access_token")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sessions_list_client_details() {
    let h = harness();
    h.store.register_application(2, "authd-mobile", "mobile").await;
    sign_up(build_test_app(&h), "alice", "pw1").await;
    sign_in(build_test_app(&h), "alice", "pw1", &[]).await;
    let pair = sign_in(
        build_test_app(&h),
        "alice",
        "pw1",
        &[("app_id", "2"), ("os_name", "android")],
    )
    .await;

    let response = get_auth(build_test_app(&h), "/account/sessions", token(&pair, "access_token")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let sessions = json.as_array().expect("sessions should be an array");
    assert_eq!(sessions.len(), 2);

    assert_eq!(sessions[0]["session_id"], 1);
    assert_eq!(sessions[0]["application_name"], "unknown");
    assert_eq!(sessions[0]["os"], "unknown");

    assert_eq!(sessions[1]["session_id"], 2);
    assert_eq!(sessions[1]["application_name"], "authd-mobile");
    assert_eq!(sessions[1]["application_type"], "mobile");
    assert_eq!(sessions[1]["os"], "android");
    assert_eq!(sessions[1]["ip_address"], "203.0.113.9");
    assert_eq!(sessions[1]["city"], "unknown");
}

#[tokio::test]
async fn logout_invalidates_the_access_token() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;
    let pair = sign_in(build_test_app(&h), "alice", "pw1", &[]).await;
    let access = token(&pair, "access_token");

    let response = post_auth(build_test_app(&h), "/account/logout", access).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "you are logged out");

    let response = post_auth(build_test_app(&h), "/auth/identity", access).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_auth(build_test_app(&h), "/auth/refresh-token", token(&pair, "refresh_token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn store_outage_returns_sanitized_500() {
    let h = harness();
    sign_up(build_test_app(&h), "alice", "pw1").await;
    let pair = sign_in(build_test_app(&h), "alice", "pw1", &[]).await;

    h.store.set_unavailable(true);
    let response = get_auth(build_test_app(&h), "/account/sessions", token(&pair, "access_token")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
