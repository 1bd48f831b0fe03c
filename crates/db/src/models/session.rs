//! Session model and DTOs.

use authd_core::types::{DbId, SessionKey, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A live session row from the `sessions` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub user_id: DbId,
    /// Per-user ordinal, starting at 1.
    pub session_id: DbId,
    /// SHA-256 hex digest of the current refresh token.
    pub refresh_token_hash: String,
    /// Current rotation token. Replaced on every refresh.
    pub refresh_uuid: String,
    pub issued_at: Timestamp,
}

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id, self.session_id)
    }
}

/// DTO for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: DbId,
    pub session_id: DbId,
    pub refresh_token_hash: String,
    pub refresh_uuid: String,
    pub issued_at: Timestamp,
}

impl NewSession {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id, self.session_id)
    }
}

/// New refresh state written by a successful rotation.
#[derive(Debug, Clone)]
pub struct SessionRotation {
    pub refresh_token_hash: String,
    pub refresh_uuid: String,
    pub issued_at: Timestamp,
}

/// A live session joined with its history entry and application names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SessionDetails {
    pub session_id: DbId,
    pub user_id: DbId,
    pub application_name: String,
    pub application_type: String,
    pub ip_address: String,
    pub city: String,
    pub os: String,
    /// When the session was created.
    pub created_at: Timestamp,
    /// When the current refresh token was issued.
    pub issued_at: Timestamp,
}
