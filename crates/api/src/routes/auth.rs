//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /sign-up        -> sign_up
/// POST /sign-in        -> sign_in
/// POST /refresh-token  -> refresh_token (refresh token as bearer)
/// POST /identity       -> identity (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/identity", post(auth::identity))
}
