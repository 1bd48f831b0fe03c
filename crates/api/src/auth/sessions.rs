//! Session lifecycle: creation, rotation, lookup, and termination.
//!
//! [`SessionManager`] is the only writer of session and history rows. It
//! never compares rotation tokens itself; the store does that inside the
//! compare-and-swap so the check and the write cannot be interleaved.

use std::net::IpAddr;
use std::sync::Arc;

use authd_core::clock::Clock;
use authd_core::token::digest_refresh_token;
use authd_core::types::{DbId, SessionKey};
use authd_db::models::session::{NewSession, Session, SessionDetails, SessionRotation};
use authd_db::models::session_history::{NewSessionHistory, UNKNOWN, UNKNOWN_APP_ID};
use authd_db::{AuthStore, RotationOutcome, StoreError};

/// Client context recorded in the history entry of a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip_address: String,
    pub os: String,
    pub app_id: DbId,
    pub city: String,
}

impl Default for ClientMeta {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            app_id: UNKNOWN_APP_ID,
            city: UNKNOWN.to_string(),
        }
    }
}

impl ClientMeta {
    /// Fill in whatever the request carried; the rest stays `"unknown"`.
    pub fn new(ip: Option<IpAddr>, os: Option<&str>, app_id: Option<DbId>) -> Self {
        let defaults = Self::default();
        Self {
            ip_address: ip.map(|ip| ip.to_string()).unwrap_or(defaults.ip_address),
            os: os
                .map(str::trim)
                .filter(|os| !os.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.os),
            app_id: app_id.unwrap_or(defaults.app_id),
            city: defaults.city,
        }
    }
}

/// Session state transitions on top of an [`AuthStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn AuthStore>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn AuthStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Reserve the user's next session ordinal. `None` if the user is gone.
    pub async fn next_ordinal(&self, user_id: DbId) -> Result<Option<DbId>, StoreError> {
        self.store.next_session_ordinal(user_id).await
    }

    /// Persist a session under a reserved ordinal together with its history
    /// entry. Either both rows exist afterwards or neither does.
    pub async fn create_session(
        &self,
        user_id: DbId,
        ordinal: DbId,
        refresh_token: &str,
        rotation_token: &str,
        client: &ClientMeta,
    ) -> Result<Session, StoreError> {
        let now = self.clock.now();
        let session = NewSession {
            user_id,
            session_id: ordinal,
            refresh_token_hash: digest_refresh_token(refresh_token),
            refresh_uuid: rotation_token.to_string(),
            issued_at: now,
        };
        let history = NewSessionHistory {
            app_id: client.app_id,
            ip_address: client.ip_address.clone(),
            city: client.city.clone(),
            os: client.os.clone(),
            created_at: now,
        };
        self.store.insert_session_and_history(&session, &history).await
    }

    /// Swap in a new refresh token and rotation token, provided the session
    /// still holds `presented_rotation`.
    pub async fn rotate(
        &self,
        session: &Session,
        presented_rotation: &str,
        new_refresh_token: &str,
        new_rotation_token: &str,
    ) -> Result<RotationOutcome, StoreError> {
        let rotation = SessionRotation {
            refresh_token_hash: digest_refresh_token(new_refresh_token),
            refresh_uuid: new_rotation_token.to_string(),
            issued_at: self.clock.now(),
        };
        self.store
            .update_session_rotation(session.key(), presented_rotation, &rotation)
            .await
    }

    /// Delete the session. Its history entry is kept.
    pub async fn terminate(&self, key: SessionKey) -> Result<bool, StoreError> {
        self.store.delete_session(key).await
    }

    pub async fn lookup_by_id(&self, key: SessionKey) -> Result<Option<Session>, StoreError> {
        self.store.get_session_by_id(key).await
    }

    pub async fn lookup_by_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError> {
        self.store.get_sessions_by_user(user_id).await
    }

    pub async fn details_by_user(&self, user_id: DbId) -> Result<Vec<SessionDetails>, StoreError> {
        self.store.get_session_details_by_user(user_id).await
    }
}
