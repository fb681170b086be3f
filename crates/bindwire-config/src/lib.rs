//! bindwire configuration
//!
//! Loads the `bindwire.toml` file that tells the binding registry which native
//! library to open, which symbol prefixes mark exported bindings, which generator
//! version the library must report, and how verbose logging should be.
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. `bindwire.toml` (found by walking up from a start directory)
//! 3. Environment variables (`BINDWIRE_*`)
//!
//! # Example
//!
//! ```no_run
//! use bindwire_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("prefixes: {:?}", config.binding.prefixes);
//! ```

pub mod binding;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// File name searched for by [`ConfigLoader`]
pub const CONFIG_FILE_NAME: &str = "bindwire.toml";

/// Symbol prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "python_bind_";

pub use binding::{BindingConfig, BindingSection, LibraryConfig, LoggingConfig};
pub use loader::ConfigLoader;
