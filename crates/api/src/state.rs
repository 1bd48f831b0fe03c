use std::sync::Arc;

use authd_db::AuthStore;

use crate::auth::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    /// The same store the service uses, for health checks.
    pub store: Arc<dyn AuthStore>,
    pub config: Arc<ServerConfig>,
}
