//! Repository for the `sessions` table.

use authd_core::types::{DbId, SessionKey};
use sqlx::{PgConnection, PgPool};

use crate::models::session::{NewSession, Session, SessionDetails, SessionRotation};
use crate::models::session_history::UNKNOWN;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "user_id, session_id, refresh_token_hash, refresh_uuid, issued_at";

/// Provides session queries.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewSession,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, session_id, refresh_token_hash, refresh_uuid, issued_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(input.session_id)
            .bind(&input.refresh_token_hash)
            .bind(&input.refresh_uuid)
            .bind(input.issued_at)
            .fetch_one(conn)
            .await
    }

    /// Find a session by its key.
    pub async fn find(pool: &PgPool, key: SessionKey) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE user_id = $1 AND session_id = $2");
        sqlx::query_as::<_, Session>(&query)
            .bind(key.user_id)
            .bind(key.session_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a session and lock its row until the surrounding transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        key: SessionKey,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE user_id = $1 AND session_id = $2
             FOR UPDATE"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(key.user_id)
            .bind(key.session_id)
            .fetch_optional(conn)
            .await
    }

    /// List a user's sessions by ordinal.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Session>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM sessions WHERE user_id = $1 ORDER BY session_id");
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the refresh token, rotation token, and issue time.
    pub async fn update_rotation(
        conn: &mut PgConnection,
        key: SessionKey,
        input: &SessionRotation,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET refresh_token_hash = $3, refresh_uuid = $4, issued_at = $5
             WHERE user_id = $1 AND session_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(key.user_id)
            .bind(key.session_id)
            .bind(&input.refresh_token_hash)
            .bind(&input.refresh_uuid)
            .bind(input.issued_at)
            .fetch_one(conn)
            .await
    }

    /// Delete a session. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, key: SessionKey) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND session_id = $2")
            .bind(key.user_id)
            .bind(key.session_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List a user's live sessions joined with history and application names.
    ///
    /// Sessions whose application id is not registered report `"unknown"`.
    pub async fn list_details_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<SessionDetails>, sqlx::Error> {
        sqlx::query_as::<_, SessionDetails>(
            "SELECT s.session_id, s.user_id,
                    COALESCE(a.name, $2) AS application_name,
                    COALESCE(t.name, $2) AS application_type,
                    h.ip_address, h.city, h.os, h.created_at, s.issued_at
             FROM sessions s
             INNER JOIN session_history h
                     ON h.user_id = s.user_id AND h.session_id = s.session_id
             LEFT JOIN applications a ON a.id = h.app_id
             LEFT JOIN application_types t ON t.id = a.type_id
             WHERE s.user_id = $1
             ORDER BY s.session_id",
        )
        .bind(user_id)
        .bind(UNKNOWN)
        .fetch_all(pool)
        .await
    }
}
