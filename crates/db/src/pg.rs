//! PostgreSQL implementation of [`AuthStore`].

use async_trait::async_trait;
use authd_core::types::{DbId, SessionKey};

use crate::models::session::{NewSession, Session, SessionDetails, SessionRotation};
use crate::models::session_history::{NewSessionHistory, SessionHistoryEntry};
use crate::models::user::{NewUser, User};
use crate::repositories::{SessionHistoryRepo, SessionRepo, UserRepo};
use crate::store::{AuthStore, RotationOutcome, StoreError};
use crate::DbPool;

/// Session store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgAuthStore {
    pool: DbPool,
}

impl PgAuthStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn insert_user(&self, user: &NewUser) -> Result<DbId, StoreError> {
        let mut tx = self.pool.begin().await?;
        let created = UserRepo::create(&mut *tx, user).await?;
        UserRepo::create_default_settings(&mut *tx, created.id).await?;
        tx.commit().await?;
        Ok(created.id)
    }

    async fn get_user_by_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_credentials(&self.pool, username, password_hash).await?)
    }

    async fn get_user_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn next_session_ordinal(&self, user_id: DbId) -> Result<Option<DbId>, StoreError> {
        Ok(UserRepo::next_session_id(&self.pool, user_id).await?)
    }

    async fn insert_session_and_history(
        &self,
        session: &NewSession,
        history: &NewSessionHistory,
    ) -> Result<Session, StoreError> {
        // Dropping `tx` without commit rolls both inserts back.
        let mut tx = self.pool.begin().await?;
        let created = SessionRepo::create(&mut *tx, session).await?;
        SessionHistoryRepo::create(&mut *tx, session.key(), history).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn get_sessions_by_user(&self, user_id: DbId) -> Result<Vec<Session>, StoreError> {
        Ok(SessionRepo::list_for_user(&self.pool, user_id).await?)
    }

    async fn get_session_by_id(&self, key: SessionKey) -> Result<Option<Session>, StoreError> {
        Ok(SessionRepo::find(&self.pool, key).await?)
    }

    async fn update_session_rotation(
        &self,
        key: SessionKey,
        expected_rotation: &str,
        rotation: &SessionRotation,
    ) -> Result<RotationOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = SessionRepo::find_for_update(&mut *tx, key).await? else {
            return Ok(RotationOutcome::Missing);
        };
        if current.refresh_uuid != expected_rotation {
            return Ok(RotationOutcome::Stale);
        }

        let updated = SessionRepo::update_rotation(&mut *tx, key, rotation).await?;
        tx.commit().await?;
        Ok(RotationOutcome::Rotated(updated))
    }

    async fn delete_session(&self, key: SessionKey) -> Result<bool, StoreError> {
        Ok(SessionRepo::delete(&self.pool, key).await?)
    }

    async fn get_session_details_by_user(
        &self,
        user_id: DbId,
    ) -> Result<Vec<SessionDetails>, StoreError> {
        Ok(SessionRepo::list_details_for_user(&self.pool, user_id).await?)
    }

    async fn get_session_history_by_user(
        &self,
        user_id: DbId,
    ) -> Result<Vec<SessionHistoryEntry>, StoreError> {
        Ok(SessionHistoryRepo::list_for_user(&self.pool, user_id).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
