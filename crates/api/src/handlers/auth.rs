//! Handlers for the `/auth` resource (sign-up, sign-in, refresh, identity).

use authd_core::token::TokenPair;
use authd_core::validation::SignUpInput;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::{AuthError, ClientMeta};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, BearerToken};
use crate::response::{IdResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/sign-up
///
/// Create an account. A body that does not parse is a validation error.
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpInput>, JsonRejection>,
) -> AppResult<Json<IdResponse>> {
    let Json(input) = payload.map_err(|rej| AuthError::Validation(rej.body_text()))?;
    let id = state.auth.sign_up(input).await?;
    Ok(Json(IdResponse { id }))
}

/// POST /auth/sign-in
///
/// Authenticate with username + password. The `app_id` and `os_name`
/// headers, and the peer address, are recorded with the new session.
pub async fn sign_in(
    State(state): State<AppState>,
    client: ClientMeta,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> AppResult<Json<TokenPair>> {
    let Json(input) = payload.map_err(|rej| AppError::BadRequest(rej.body_text()))?;
    let pair = state
        .auth
        .sign_in(&input.username, &input.password, &client)
        .await?;
    Ok(Json(pair))
}

/// POST /auth/refresh-token
///
/// Exchange the bearer refresh token for a new pair.
pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<TokenPair>> {
    Ok(Json(state.auth.refresh(&token).await?))
}

/// POST /auth/identity
///
/// Succeeds only for a live access token.
pub async fn identity(user: AuthUser) -> Json<MessageResponse> {
    tracing::debug!(
        user_id = user.claims.user_id,
        session_id = user.claims.session_id,
        "Identity confirmed"
    );
    Json(MessageResponse {
        message: "access granted",
    })
}
