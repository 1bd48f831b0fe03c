//! Session history (audit) model and DTOs.

use authd_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Application id recorded when the client does not send one.
pub const UNKNOWN_APP_ID: DbId = 1;

/// Placeholder for OS, city, and IP when the client context is unknown.
pub const UNKNOWN: &str = "unknown";

/// An append-only row from the `session_history` table.
///
/// Entries outlive the session they describe.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SessionHistoryEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub session_id: DbId,
    pub app_id: DbId,
    pub ip_address: String,
    pub city: String,
    pub os: String,
    pub created_at: Timestamp,
}

/// DTO for the history row written alongside a new session.
#[derive(Debug, Clone)]
pub struct NewSessionHistory {
    pub app_id: DbId,
    pub ip_address: String,
    pub city: String,
    pub os: String,
    pub created_at: Timestamp,
}
