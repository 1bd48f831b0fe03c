use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::AuthError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`AuthError`] for protocol outcomes and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An outcome of the authentication service.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A malformed request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Auth(auth) => match auth {
                AuthError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                AuthError::DuplicateUsername => {
                    (StatusCode::CONFLICT, "DUPLICATE_USERNAME", auth.to_string())
                }
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", auth.to_string())
                }
                AuthError::Unauthenticated(_) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", auth.to_string())
                }
                AuthError::TokenReuseDetected => {
                    (StatusCode::UNAUTHORIZED, "TOKEN_REUSE_DETECTED", auth.to_string())
                }
                AuthError::SessionNotFound => {
                    (StatusCode::UNAUTHORIZED, "SESSION_NOT_FOUND", auth.to_string())
                }
                AuthError::Store(err) => {
                    tracing::error!(error = %err, "Store error");
                    internal()
                }
                AuthError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal error");
                    internal()
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
