//! The session store contract.
//!
//! Every read returns `Ok(None)` (or an empty list) when nothing matches;
//! `Err` is reserved for infrastructure failures so callers never confuse
//! "no such session" with "the store is down". Nothing here retries.

use async_trait::async_trait;
use authd_core::types::{DbId, SessionKey};

use crate::models::session::{NewSession, Session, SessionDetails, SessionRotation};
use crate::models::session_history::{NewSessionHistory, SessionHistoryEntry};
use crate::models::user::{NewUser, User};

/// PostgreSQL SQLSTATE for `unique_violation`.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Unique constraint guarding usernames.
pub const USERNAME_CONSTRAINT: &str = "uq_users_username";

/// Persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// `true` when the failure is a unique violation on `constraint`.
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint: c } if c == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Result of a compare-and-swap on a session's rotation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The presented token matched and the session now holds the new one.
    Rotated(Session),
    /// The presented token is no longer the session's current one.
    Stale,
    /// The session does not exist.
    Missing,
}

/// Transactional store for users, sessions, and session history.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Insert a user and its default settings row in one transaction.
    async fn insert_user(&self, user: &NewUser) -> Result<DbId, StoreError>;

    /// Find a user matching both the username and the password hash.
    async fn get_user_by_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn get_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    /// Atomically allocate the user's next session ordinal (first is 1).
    ///
    /// Ordinals are never handed out twice, even after logout. Returns
    /// `None` if the user does not exist.
    async fn next_session_ordinal(&self, user_id: DbId) -> Result<Option<DbId>, StoreError>;

    /// Insert a session and its history entry. Both rows commit or neither does.
    async fn insert_session_and_history(
        &self,
        session: &NewSession,
        history: &NewSessionHistory,
    ) -> Result<Session, StoreError>;

    /// All live sessions of a user, ordered by ordinal.
    async fn get_sessions_by_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError>;

    async fn get_session_by_id(&self, key: SessionKey) -> Result<Option<Session>, StoreError>;

    /// Replace the session's refresh state if, and only if, its current
    /// rotation token equals `expected_rotation`. The read, comparison, and
    /// write happen under a single per-session lock.
    async fn update_session_rotation(
        &self,
        key: SessionKey,
        expected_rotation: &str,
        rotation: &SessionRotation,
    ) -> Result<RotationOutcome, StoreError>;

    /// Delete a session. History entries are kept. Returns `true` if a row
    /// was removed.
    async fn delete_session(&self, key: SessionKey) -> Result<bool, StoreError>;

    /// Live sessions joined with their history entry and application names.
    async fn get_session_details_by_user(
        &self,
        user_id: DbId,
    ) -> Result<Vec<SessionDetails>, StoreError>;

    /// Every history entry recorded for a user, oldest first.
    async fn get_session_history_by_user(
        &self,
        user_id: DbId,
    ) -> Result<Vec<SessionHistoryEntry>, StoreError>;

    /// Confirm the backing store is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
