//! Configuration Loader
//!
//! Finds `bindwire.toml` and applies environment overrides on top of it.

use crate::binding::BindingConfig;
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding `library.path`
pub const ENV_LIBRARY: &str = "BINDWIRE_LIBRARY";
/// Environment variable overriding `binding.prefixes` (comma-separated)
pub const ENV_PREFIXES: &str = "BINDWIRE_PREFIXES";
/// Environment variable overriding `logging.level`
pub const ENV_LOG_LEVEL: &str = "BINDWIRE_LOG_LEVEL";

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Built-in defaults
/// 2. `bindwire.toml`
/// 3. Environment variables (`BINDWIRE_*`)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip environment overrides (tests and embedding hosts)
    ignore_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Loader that never reads `BINDWIRE_*` variables
    pub fn without_env() -> Self {
        Self { ignore_env: true }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find `bindwire.toml`. When none is found
    /// the defaults are used.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<BindingConfig> {
        let config = match self.find_config_file(start_dir) {
            Some(path) => BindingConfig::load_from_file(&path)?,
            None => BindingConfig::default(),
        };
        self.finish(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<BindingConfig> {
        let config = BindingConfig::load_from_file(config_path)?;
        self.finish(config)
    }

    /// Locate `bindwire.toml` by walking up from `start_dir`
    pub fn find_config_file(&self, start_dir: &Path) -> Option<PathBuf> {
        let mut current = Some(start_dir);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = dir.parent();
        }
        None
    }

    fn finish(&self, config: BindingConfig) -> ConfigResult<BindingConfig> {
        let config = if self.ignore_env {
            config
        } else {
            self.apply_env_overrides(config)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: BindingConfig) -> ConfigResult<BindingConfig> {
        if let Ok(library) = env::var(ENV_LIBRARY) {
            config.library.path = Some(library);
        }

        if let Ok(prefixes) = env::var(ENV_PREFIXES) {
            let parsed: Vec<String> = prefixes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if parsed.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_PREFIXES.to_string(),
                    reason: "no prefixes given".to_string(),
                });
            }
            config.binding.prefixes = parsed;
        }

        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            config.logging.level = level.to_lowercase();
        }

        Ok(config)
    }
}
