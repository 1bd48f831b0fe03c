use serde::{Deserialize, Serialize};

/// All database primary keys are PostgreSQL BIGINT / BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Address of a single session.
///
/// Session ids are ordinals allocated per user, so a session is only unique
/// together with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: DbId,
    pub session_id: DbId,
}

impl SessionKey {
    pub fn new(user_id: DbId, session_id: DbId) -> Self {
        Self {
            user_id,
            session_id,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}
