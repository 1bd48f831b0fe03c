//! In-process implementation of [`AuthStore`].
//!
//! All state sits behind one async mutex, which gives every operation the
//! same serialization a row lock would. Multi-row writes are staged on a copy
//! of the state and swapped in only once every step has succeeded, so a
//! failure halfway through leaves nothing behind.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use authd_core::types::{DbId, SessionKey};
use tokio::sync::Mutex;

use crate::models::session::{NewSession, Session, SessionDetails, SessionRotation};
use crate::models::session_history::{
    NewSessionHistory, SessionHistoryEntry, UNKNOWN, UNKNOWN_APP_ID,
};
use crate::models::user::{NewUser, User};
use crate::store::{AuthStore, RotationOutcome, StoreError, USERNAME_CONSTRAINT};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    last_session_id: DbId,
}

#[derive(Debug, Clone, Copy)]
struct UserSettings {
    data_encryption_enabled: bool,
    cloud_notifications_enabled: bool,
}

#[derive(Debug, Clone)]
struct Application {
    name: String,
    type_name: String,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<DbId, StoredUser>,
    settings: BTreeMap<DbId, UserSettings>,
    sessions: BTreeMap<SessionKey, Session>,
    history: Vec<SessionHistoryEntry>,
    applications: BTreeMap<DbId, Application>,
    last_user_id: DbId,
    last_history_id: DbId,
}

/// Session store held entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_next_history_insert: AtomicBool,
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store with the `"unknown"` application registered under
    /// [`UNKNOWN_APP_ID`].
    pub fn new() -> Self {
        let mut state = State::default();
        state.applications.insert(
            UNKNOWN_APP_ID,
            Application {
                name: UNKNOWN.to_string(),
                type_name: UNKNOWN.to_string(),
            },
        );
        Self {
            state: Mutex::new(state),
            fail_next_history_insert: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Register a client application so session listings can name it.
    pub async fn register_application(&self, id: DbId, name: &str, type_name: &str) {
        self.state.lock().await.applications.insert(
            id,
            Application {
                name: name.to_string(),
                type_name: type_name.to_string(),
            },
        );
    }

    /// Make the next history insert fail after the session row was staged.
    pub fn fail_next_history_insert(&self) {
        self.fail_next_history_insert.store(true, Ordering::SeqCst);
    }

    /// While set, every operation fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Whether the settings row for `user_id` exists with both flags on.
    pub async fn has_default_settings(&self, user_id: DbId) -> bool {
        self.state
            .lock()
            .await
            .settings
            .get(&user_id)
            .is_some_and(|s| s.data_encryption_enabled && s.cloud_notifications_enabled)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn insert_user(&self, user: &NewUser) -> Result<DbId, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.user.username == user.username) {
            return Err(StoreError::UniqueViolation {
                constraint: USERNAME_CONSTRAINT.to_string(),
            });
        }

        let id = state.last_user_id + 1;
        state.last_user_id = id;
        state.users.insert(
            id,
            StoredUser {
                user: User {
                    id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                    role_id: user.role_id,
                    avatar_id: user.avatar_id,
                    created_at: chrono::Utc::now(),
                },
                last_session_id: 0,
            },
        );
        state.settings.insert(
            id,
            UserSettings {
                data_encryption_enabled: true,
                cloud_notifications_enabled: true,
            },
        );
        Ok(id)
    }

    async fn get_user_by_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.user.username == username && u.user.password_hash == password_hash)
            .map(|u| u.user.clone()))
    }

    async fn get_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| u.user.clone()))
    }

    async fn next_session_ordinal(&self, user_id: DbId) -> Result<Option<DbId>, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(&user_id).map(|u| {
            u.last_session_id += 1;
            u.last_session_id
        }))
    }

    async fn insert_session_and_history(
        &self,
        session: &NewSession,
        history: &NewSessionHistory,
    ) -> Result<Session, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let mut staged = state.clone();
        let key = session.key();

        if staged.sessions.contains_key(&key) {
            return Err(StoreError::UniqueViolation {
                constraint: "pk_sessions".to_string(),
            });
        }
        let created = Session {
            user_id: session.user_id,
            session_id: session.session_id,
            refresh_token_hash: session.refresh_token_hash.clone(),
            refresh_uuid: session.refresh_uuid.clone(),
            issued_at: session.issued_at,
        };
        staged.sessions.insert(key, created.clone());

        if self.fail_next_history_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected failure writing session history".into(),
            ));
        }
        let id = staged.last_history_id + 1;
        staged.last_history_id = id;
        staged.history.push(SessionHistoryEntry {
            id,
            user_id: key.user_id,
            session_id: key.session_id,
            app_id: history.app_id,
            ip_address: history.ip_address.clone(),
            city: history.city.clone(),
            os: history.os.clone(),
            created_at: history.created_at,
        });

        *state = staged;
        Ok(created)
    }

    async fn get_sessions_by_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_session_by_id(&self, key: SessionKey) -> Result<Option<Session>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.sessions.get(&key).cloned())
    }

    async fn update_session_rotation(
        &self,
        key: SessionKey,
        expected_rotation: &str,
        rotation: &SessionRotation,
    ) -> Result<RotationOutcome, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let Some(session) = state.sessions.get_mut(&key) else {
            return Ok(RotationOutcome::Missing);
        };
        if session.refresh_uuid != expected_rotation {
            return Ok(RotationOutcome::Stale);
        }

        session.refresh_token_hash = rotation.refresh_token_hash.clone();
        session.refresh_uuid = rotation.refresh_uuid.clone();
        session.issued_at = rotation.issued_at;
        Ok(RotationOutcome::Rotated(session.clone()))
    }

    async fn delete_session(&self, key: SessionKey) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.sessions.remove(&key).is_some())
    }

    async fn get_session_details_by_user(
        &self,
        user_id: DbId,
    ) -> Result<Vec<SessionDetails>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;

        let details = state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                let entry = state
                    .history
                    .iter()
                    .find(|h| h.user_id == s.user_id && h.session_id == s.session_id)?;
                let app = state.applications.get(&entry.app_id);
                Some(SessionDetails {
                    session_id: s.session_id,
                    user_id: s.user_id,
                    application_name: app.map_or(UNKNOWN, |a| a.name.as_str()).to_string(),
                    application_type: app.map_or(UNKNOWN, |a| a.type_name.as_str()).to_string(),
                    ip_address: entry.ip_address.clone(),
                    city: entry.city.clone(),
                    os: entry.os.clone(),
                    created_at: entry.created_at,
                    issued_at: s.issued_at,
                })
            })
            .collect();
        Ok(details)
    }

    async fn get_session_history_by_user(
        &self,
        user_id: DbId,
    ) -> Result<Vec<SessionHistoryEntry>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
