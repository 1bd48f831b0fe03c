//! Request metadata recorded when a session is opened.

use std::convert::Infallible;
use std::net::SocketAddr;

use authd_core::types::DbId;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::ClientMeta;

/// Header naming the calling application.
pub const APP_ID_HEADER: &str = "app_id";
/// Header naming the client operating system.
pub const OS_NAME_HEADER: &str = "os_name";

impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let app_id = app_id(&parts.headers);
        let os = header_str(&parts.headers, OS_NAME_HEADER);
        Ok(ClientMeta::new(peer, os, app_id))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The caller's application id. Anything unparsable falls back to the
/// unknown application.
fn app_id(headers: &HeaderMap) -> Option<DbId> {
    let raw = header_str(headers, APP_ID_HEADER)?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::debug!(app_id = %raw, "Ignoring non-numeric app_id header");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn app_id_falls_back_when_absent_or_unparsable() {
        let mut headers = HeaderMap::new();
        assert_eq!(app_id(&headers), None);

        headers.insert(APP_ID_HEADER, HeaderValue::from_static("4"));
        assert_eq!(app_id(&headers), Some(4));

        headers.insert(APP_ID_HEADER, HeaderValue::from_static("web"));
        assert_eq!(app_id(&headers), None);

        headers.insert(APP_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(app_id(&headers), None);
    }
}
