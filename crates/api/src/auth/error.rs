use authd_core::error::{HashError, TokenError};
use authd_db::StoreError;

/// Outcome of a failed authentication operation.
///
/// Store failures stay in [`AuthError::Store`] and are never folded into a
/// "not found" kind.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Username is already taken")]
    DuplicateUsername,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// A refresh token was presented after its rotation token was replaced.
    #[error("Refresh token has already been used")]
    TokenReuseDetected,

    #[error("Session not found")]
    SessionNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Hashing or token encoding failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// A presented token failed to decode.
    pub fn rejected(err: TokenError) -> Self {
        AuthError::Unauthenticated(err.to_string())
    }

    /// A token could not be signed.
    pub fn issuing(err: TokenError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
