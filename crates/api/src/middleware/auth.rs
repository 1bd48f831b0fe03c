//! Bearer-token extractors for Axum handlers.

use authd_core::token::AccessClaims;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::AuthError;
use crate::error::AppError;
use crate::state::AppState;

/// The raw token from an `Authorization: Bearer <token>` header.
///
/// The header must be exactly the scheme, one space, and a non-empty token.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|token| BearerToken(token.to_string()))
            .map_err(AppError::from)
    }
}

/// Caller authenticated by a live access token.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.claims.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: AccessClaims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.auth.validate_access(token).await?;
        Ok(AuthUser { claims })
    }
}

/// Pull the token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthenticated("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| AuthError::Unauthenticated("Invalid Authorization header".into()))?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::Unauthenticated(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_exact_bearer_scheme() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_everything_else() {
        for value in ["bearer abc", "Bearer", "Bearer ", "Bearer  abc", "Bearer a b", "Basic abc"] {
            assert_matches!(
                bearer_token(&headers(value)),
                Err(AuthError::Unauthenticated(_)),
                "{value:?} should be rejected"
            );
        }
        assert_matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::Unauthenticated(_))
        );
    }
}
