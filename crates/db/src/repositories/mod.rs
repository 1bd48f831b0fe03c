//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads take `&PgPool`; writes that must share a transaction take
//! `&mut PgConnection`.

pub mod session_history_repo;
pub mod session_repo;
pub mod user_repo;

pub use session_history_repo::SessionHistoryRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
