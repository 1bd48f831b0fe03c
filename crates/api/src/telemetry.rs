//! Tracing subscriber setup for the binary.

use std::path::PathBuf;

use authd_core::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target of security events such as refresh token reuse.
pub const SECURITY_TARGET: &str = "authd::security";

/// Filter used when `RUST_LOG` is unset. Security events sit outside the
/// `authd_api` prefix, so they need their own directive.
pub const DEFAULT_LOG_FILTER: &str = "authd_api=debug,tower_http=debug,authd::security=warn";

/// File name prefix of the daily log files under `LOG_DIR`.
const LOG_FILE_PREFIX: &str = "authd.log";

/// Output settings read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// `LOG_FORMAT=json` writes JSON lines to stdout.
    pub json: bool,
    /// `LOG_DIR` adds a daily-rolling plain-text file sink.
    pub dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self {
            json: env::optional("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            dir: env::optional("LOG_DIR").map(PathBuf::from),
        }
    }
}

/// `RUST_LOG` if set, otherwise [`DEFAULT_LOG_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file sink on drop; keep it alive for the
/// lifetime of the process.
pub fn init(settings: &LogSettings) -> Option<WorkerGuard> {
    let (file_layer, guard) = match &settings.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    guard
}
