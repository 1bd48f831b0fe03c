//! Repository for the `session_history` table.

use authd_core::types::{DbId, SessionKey};
use sqlx::{PgConnection, PgPool};

use crate::models::session_history::{NewSessionHistory, SessionHistoryEntry};

const COLUMNS: &str = "id, user_id, session_id, app_id, ip_address, city, os, created_at";

/// Provides session history queries. Rows are never updated or deleted here.
pub struct SessionHistoryRepo;

impl SessionHistoryRepo {
    /// Append the history entry for a newly created session.
    pub async fn create(
        conn: &mut PgConnection,
        key: SessionKey,
        input: &NewSessionHistory,
    ) -> Result<SessionHistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO session_history (user_id, session_id, app_id, ip_address, city, os, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionHistoryEntry>(&query)
            .bind(key.user_id)
            .bind(key.session_id)
            .bind(input.app_id)
            .bind(&input.ip_address)
            .bind(&input.city)
            .bind(&input.os)
            .bind(input.created_at)
            .fetch_one(conn)
            .await
    }

    /// List every history entry for a user, oldest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<SessionHistoryEntry>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM session_history WHERE user_id = $1 ORDER BY id");
        sqlx::query_as::<_, SessionHistoryEntry>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
