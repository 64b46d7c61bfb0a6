//! Logging setup for nativepack
//!
//! All diagnostics go through `tracing` and are written to stderr, so the
//! output of `nativepack plan` on stdout stays machine-readable.
//!
//! `RUST_LOG` takes precedence over the configured level when set.
//!
//! # Example
//!
//! ```no_run
//! use nativepack::util::logging;
//!
//! // With environment: NATIVEPACK_LOG_LEVEL=debug
//! logging::init_from_env();
//!
//! tracing::info!("native-image step starting");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for nativepack's own events
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g., nativepack::image::version)
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Level from the command line flags
    ///
    /// An explicit `--log-level` wins over `--verbose`, which wins over
    /// `--quiet`. Without any flag `NATIVEPACK_LOG_LEVEL` is consulted.
    pub fn from_flags(log_level: Option<&str>, verbose: bool, quiet: bool) -> Self {
        let level = match log_level {
            Some(level) => parse_level(level),
            None if verbose => Level::DEBUG,
            None if quiet => Level::ERROR,
            None => env_level(),
        };

        Self {
            level,
            use_json: env_json(),
            include_target: verbose,
            ..Default::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,nativepack={}", self.level)))
    }
}

/// Parses a log level, case-insensitive; unknown values fall back to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn env_level() -> Level {
    env::var("NATIVEPACK_LOG_LEVEL")
        .map(|level| parse_level(&level))
        .unwrap_or(Level::INFO)
}

fn env_json() -> bool {
    env::var("NATIVEPACK_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.filter();

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `NATIVEPACK_LOG_LEVEL` and `NATIVEPACK_LOG_JSON`
pub fn init_from_env() {
    init_logging(LoggingConfig {
        level: env_level(),
        use_json: env_json(),
        ..Default::default()
    });
}
