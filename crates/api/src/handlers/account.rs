//! Handlers for the `/account` resource.

use authd_db::models::session::SessionDetails;
use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::BearerToken;
use crate::response::MessageResponse;
use crate::state::AppState;

/// GET /account/sessions
///
/// Live sessions of the caller with client and application details.
pub async fn sessions(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<Vec<SessionDetails>>> {
    Ok(Json(state.auth.list_sessions(&token).await?))
}

/// POST /account/logout
///
/// End the session the access token belongs to.
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<MessageResponse>> {
    state.auth.logout(&token).await?;
    Ok(Json(MessageResponse {
        message: "you are logged out",
    }))
}
