use std::net::SocketAddr;
use std::sync::Arc;

use authd_core::clock::{Clock, SystemClock};
use authd_core::password::Argon2Hasher;
use authd_core::token::TokenCodec;
use authd_db::{AuthStore, MemoryStore, PgAuthStore};

use authd_api::auth::AuthService;
use authd_api::config::{ServerConfig, StoreBackend};
use authd_api::state::AppState;
use authd_api::telemetry::{self, LogSettings};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let _log_guard = telemetry::init(&LogSettings::from_env());

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(host = %config.host, port = %config.port, store = ?config.store, "Loaded server configuration");

    // --- Store ---
    let store: Arc<dyn AuthStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let pool = authd_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            authd_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            authd_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgAuthStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; all sessions are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Auth service ---
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let hasher = Argon2Hasher::new(&config.password_salt, config.password_pepper.as_deref())
        .expect("AUTH_PASSWORD_SALT must be valid unpadded base64");
    let codec = TokenCodec::new(&config.token, Arc::clone(&clock));
    let auth = AuthService::new(
        Arc::clone(&store),
        Arc::new(hasher),
        codec,
        config.auth.clone(),
        clock,
    )
    .with_span(tracing::info_span!("auth_service"));

    // --- App state ---
    let state = AppState {
        auth: Arc::new(auth),
        store,
        config: Arc::new(config.clone()),
    };

    let app = authd_api::app::build(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Peer addresses feed the session history.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
