//! Route definitions for the `/account` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::account;
use crate::state::AppState;

/// Routes mounted at `/account`. All require an access token.
///
/// ```text
/// GET  /sessions  -> sessions
/// POST /logout    -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(account::sessions))
        .route("/logout", post(account::logout))
}
