//! Binding configuration (bindwire.toml)

use crate::{ConfigError, ConfigResult, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration read from `bindwire.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// Native library location
    #[serde(default)]
    pub library: LibraryConfig,

    /// Symbol discovery and version handshake
    #[serde(default)]
    pub binding: BindingSection,

    /// Logging output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the native library lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LibraryConfig {
    /// Library path, or a short name resolved through `search_paths`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Extra directories searched before the platform defaults
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
}

/// How exported symbols are discovered and checked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BindingSection {
    /// Symbol prefixes that mark a function as a binding
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,

    /// Version the library must report through its version symbol
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,

    /// Declaration manifest emitted by the source scanner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declarations: Option<PathBuf>,
}

impl Default for BindingSection {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            expected_version: None,
            declarations: None,
        }
    }
}

fn default_prefixes() -> Vec<String> {
    vec![DEFAULT_PREFIX.to_string()]
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level: trace, debug, info, warn or error
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl BindingConfig {
    /// Load binding configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error: e,
            })?;

        // Relative manifest paths are relative to the config file
        if let (Some(decl), Some(dir)) = (config.binding.declarations.as_mut(), path.parent()) {
            if decl.is_relative() {
                *decl = dir.join(&*decl);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.binding.prefixes.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "binding.prefixes".to_string(),
                reason: "at least one prefix is required".to_string(),
            });
        }

        if self.binding.prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "binding.prefixes".to_string(),
                reason: "prefixes cannot be empty strings".to_string(),
            });
        }

        if let Some(version) = &self.binding.expected_version {
            if version.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "binding.expected-version".to_string(),
                    reason: "version cannot be empty".to_string(),
                });
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!(
                    "unknown level '{}', expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        if let Some(path) = &self.library.path {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "library.path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Library path or name, if configured
    pub fn library_path(&self) -> Option<&str> {
        self.library.path.as_deref()
    }
}
