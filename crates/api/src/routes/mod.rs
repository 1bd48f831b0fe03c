pub mod account;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree.
///
/// ```text
/// /auth/sign-up              create account (public)
/// /auth/sign-in              open a session (public)
/// /auth/refresh-token        rotate refresh token (bearer refresh token)
/// /auth/identity             check an access token (bearer access token)
///
/// /account/sessions          list live sessions (bearer access token)
/// /account/logout            end current session (bearer access token)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/account", account::router())
}
