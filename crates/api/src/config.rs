use authd_core::env;
use authd_core::error::ConfigError;
use authd_core::token::TokenConfig;

use crate::auth::AuthSettings;

/// Which [`authd_db::AuthStore`] implementation backs the server.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// Process-local store. State is lost on restart; development only.
    Memory,
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Postgres { .. } => f.write_str("Postgres"),
            StoreBackend::Memory => f.write_str("Memory"),
        }
    }
}

impl StoreBackend {
    /// Resolve `AUTH_STORE` (`postgres` or `memory`) and `DATABASE_URL`.
    pub fn select(kind: Option<&str>, database_url: Option<String>) -> Result<Self, ConfigError> {
        match kind.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
            None | Some("postgres") => database_url
                .map(|database_url| StoreBackend::Postgres { database_url })
                .ok_or(ConfigError::Missing("DATABASE_URL")),
            Some("memory") => Ok(StoreBackend::Memory),
            Some(other) => Err(ConfigError::Invalid {
                var: "AUTH_STORE",
                reason: format!("unknown store '{other}', expected 'postgres' or 'memory'"),
            }),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Everything the service needs is read once here and handed to the
/// constructors that use it.
#[derive(Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub store: StoreBackend,
    pub auth: AuthSettings,
    pub token: TokenConfig,
    /// Base64 (unpadded) salt shared by every password hash.
    pub password_salt: String,
    /// Optional secret mixed into every password hash.
    pub password_pepper: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("store", &self.store)
            .field("auth", &self.auth)
            .field("token", &self.token)
            .field("password_pepper", &self.password_pepper.is_some())
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Required            | Default                 |
    /// |------------------------|---------------------|-------------------------|
    /// | `HOST`                 | no                  | `0.0.0.0`               |
    /// | `PORT`                 | no                  | `3000`                  |
    /// | `CORS_ORIGINS`         | no                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | no                  | `30`                    |
    /// | `AUTH_STORE`           | no                  | `postgres`              |
    /// | `DATABASE_URL`         | with `postgres`     | --                      |
    /// | `AUTH_PASSWORD_SALT`   | **yes**             | --                      |
    /// | `AUTH_PASSWORD_PEPPER` | no                  | --                      |
    ///
    /// Token settings come from [`TokenConfig::from_env`] and account policy
    /// from [`AuthSettings::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::optional("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = env::parse_or("PORT", 3000u16)?;
        let cors_origins = parse_origins(
            &env::optional("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into()),
        )?;
        let request_timeout_secs = env::parse_or("REQUEST_TIMEOUT_SECS", 30u64)?;
        let store = StoreBackend::select(
            env::optional("AUTH_STORE").as_deref(),
            env::optional("DATABASE_URL"),
        )?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store,
            auth: AuthSettings::from_env()?,
            token: TokenConfig::from_env()?,
            password_salt: env::require("AUTH_PASSWORD_SALT")?,
            password_pepper: env::optional("AUTH_PASSWORD_PEPPER"),
        })
    }
}

/// Split `CORS_ORIGINS`. The wildcard is refused because the CORS layer
/// allows credentials.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::Invalid {
            var: "CORS_ORIGINS",
            reason: "wildcard origin is not allowed; list origins explicitly".into(),
        });
    }
    Ok(origins)
}
