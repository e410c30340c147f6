//! Subscriber setup for binaries embedding the dev server.
//!
//! Requires the `logging` feature. The plugin itself only emits `tracing`
//! events: setup failures and the server address at `info`, one `debug`
//! event per bridged request, and handler errors at `error`. A host that
//! already installs a subscriber does not need this module.

use std::sync::Once;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Verbosity of the dev server output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    /// Failed setup and failed requests
    Error,
    Warn,
    /// Server address and plugin setup
    #[default]
    Info,
    /// Every bridged request with its environment and entry
    Debug,
}

impl LogLevel {
    fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }

    fn directive(self) -> Directive {
        self.level_filter().into()
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let level = match value.to_ascii_lowercase().as_str() {
            "silent" | "off" => LogLevel::Silent,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            other => return Err(format!("Unknown log level '{}'", other)),
        };
        Ok(level)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        })
    }
}

/// Install a compact fmt subscriber at `level`.
///
/// `RUST_LOG` directives are applied on top, so
/// `RUST_LOG=fob_plugin_fullstack=debug` still enables request logs.
/// Later calls are no-ops.
///
/// ```rust,no_run
/// use fob_plugin_fullstack::logging::{LogLevel, init_logging};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        install(
            EnvFilter::builder()
                .with_default_directive(level.directive())
                .from_env_lossy(),
        );
    });
}

/// Like [`init_logging`], with the level taken from `RUST_LOG` alone.
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LogLevel::Info.directive()));
        install(filter);
    });
}

fn install(filter: EnvFilter) {
    // Keep a subscriber the embedding binary already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).without_time())
        .try_init();
}
