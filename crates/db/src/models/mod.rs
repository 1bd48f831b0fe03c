//! Row structs and insert DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Plain DTO structs for inserts and updates

pub mod session;
pub mod session_history;
pub mod user;
