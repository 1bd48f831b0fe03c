//! Repository for the `users` and `user_settings` tables.

use authd_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::user::{NewUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, role_id, avatar_id, created_at";

/// Provides user queries.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(conn: &mut PgConnection, input: &NewUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, role_id, avatar_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .bind(input.avatar_id)
            .fetch_one(conn)
            .await
    }

    /// Insert the default settings row for a freshly created user.
    pub async fn create_default_settings(
        conn: &mut PgConnection,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_settings (user_id, data_encryption_enabled, cloud_notifications_enabled)
             VALUES ($1, true, true)",
        )
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Find a user by username and password hash in a single lookup.
    pub async fn find_by_credentials(
        pool: &PgPool,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM users WHERE username = $1 AND password_hash = $2");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .bind(password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Bump the user's session counter and return the new value.
    ///
    /// The row lock taken by the `UPDATE` serializes concurrent sign-ins of
    /// the same user. Returns `None` if the user does not exist.
    pub async fn next_session_id(pool: &PgPool, user_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "UPDATE users SET last_session_id = last_session_id + 1
             WHERE id = $1
             RETURNING last_session_id",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
