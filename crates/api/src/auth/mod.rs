//! Session-bound authentication.
//!
//! - [`service`] -- the public protocol: sign-up, sign-in, refresh, access
//!   validation, logout, and session listing.
//! - [`sessions`] -- every session state transition, on top of the store.
//! - [`error`] -- the outcomes callers can observe.

pub mod error;
pub mod service;
pub mod sessions;

pub use error::{AuthError, AuthResult};
pub use service::{AuthService, AuthSettings};
pub use sessions::{ClientMeta, SessionManager};
