//! Logging setup - `tracing` subscriber for hosts embedding the runtime
//!
//! The runtime only emits events; nothing is printed until a host calls
//! [`init`] or [`init_with_config`]. `BINDWIRE_LOG` takes a full `EnvFilter`
//! directive and wins over the configured level.

use bindwire_config::loader::ENV_LOG_LEVEL;
use bindwire_config::LoggingConfig;
use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive variable, e.g. `BINDWIRE_LOG=bindwire_runtime=trace`
pub const ENV_FILTER: &str = "BINDWIRE_LOG";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default level for the runtime's events
    pub level: Level,
    /// JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            config.level = parse_level(&level);
        }
        config.json = std::env::var("BINDWIRE_LOG_JSON").is_ok();
        config
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: parse_level(&config.level),
            json: config.json,
        }
    }
}

/// Unknown level names fall back to `info`
fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(ENV_FILTER).unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bindwire_runtime={}",
            config.level.as_str().to_lowercase()
        ))
    })
}

/// Initialize logging from the environment
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    init_with_config(LogConfig::from_env())
}

/// Initialize logging with custom configuration
///
/// Returns false when a global subscriber was already installed.
pub fn init_with_config(config: LogConfig) -> bool {
    let registry = tracing_subscriber::registry().with(filter(&config));
    let layer = fmt::layer().with_writer(io::stderr).with_target(true);
    let result = if config.json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    result.is_ok()
}
