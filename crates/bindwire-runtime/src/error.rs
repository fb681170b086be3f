//! Error taxonomy for marshaling, calls and registry construction

use crate::ffi::loader::LoadError;
use crate::keys::HashableKind;
use crate::signature::IntWidth;
use bindwire_config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Errors raised anywhere between parsing a declaration and decoding a return value
#[derive(Error, Debug)]
pub enum BindError {
    #[error("Unsupported type '{token}'")]
    UnsupportedType { token: String },

    #[error("Type mismatch{}: expected {expected}, found {found}", at(.position))]
    TypeMismatch {
        expected: String,
        found: String,
        position: String,
    },

    #[error("Missing type hint for '{symbol}'{}", at(.position))]
    MissingTypeHint { symbol: String, position: String },

    #[error("'{symbol}' expects {expected} arguments, got {got}")]
    ArityMismatch {
        symbol: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid string: {0}")]
    InvalidString(String),

    #[error("Key {value} is out of range for {kind} keys")]
    KeyOutOfRange { kind: HashableKind, value: String },

    #[error("Integer {value} does not fit {width}{}", at(.position))]
    IntOutOfRange {
        width: IntWidth,
        value: String,
        position: String,
    },

    #[error("'{symbol}' returned a null wire value")]
    NullPointer { symbol: String },

    #[error("Duplicate binding '{0}'")]
    DuplicateBinding(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error(transparent)]
    LoadError(#[from] LoadError),

    #[error("Version mismatch: expected {expected}, library reports {found}")]
    VersionMismatch { expected: String, found: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for bindwire operations
pub type BindResult<T> = Result<T, BindError>;

fn at(position: &str) -> String {
    if position.is_empty() {
        String::new()
    } else {
        format!(" at {}", position)
    }
}

impl BindError {
    /// Unsupported type naming the offending token
    pub fn unsupported(token: impl Into<String>) -> Self {
        BindError::UnsupportedType {
            token: token.into(),
        }
    }

    /// Shape disagreement at the current position
    pub fn mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        BindError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            position: String::new(),
        }
    }

    /// Integer outside the declared width at the current position
    pub fn int_out_of_range(width: IntWidth, value: impl Into<String>) -> Self {
        BindError::IntOutOfRange {
            width,
            value: value.into(),
            position: String::new(),
        }
    }

    /// Unresolved slot at `position`; the proxy fills in the symbol
    pub fn missing_hint(position: impl Into<String>) -> Self {
        BindError::MissingTypeHint {
            symbol: String::new(),
            position: position.into(),
        }
    }

    /// Prepend a path segment (`[2]`, `.value`, `arg0`) to the error position
    pub fn within(mut self, segment: &str) -> Self {
        match &mut self {
            BindError::TypeMismatch { position, .. }
            | BindError::MissingTypeHint { position, .. }
            | BindError::IntOutOfRange { position, .. } => {
                position.insert_str(0, segment);
            }
            _ => {}
        }
        self
    }

    /// Prepend a container index to the error position
    pub fn at_index(self, idx: usize) -> Self {
        self.within(&format!("[{}]", idx))
    }

    /// Attach the binding name to errors that report one
    pub fn for_symbol(mut self, name: &str) -> Self {
        match &mut self {
            BindError::MissingTypeHint { symbol, .. } | BindError::NullPointer { symbol }
                if symbol.is_empty() =>
            {
                symbol.push_str(name);
            }
            _ => {}
        }
        self
    }

    /// Position path of a mismatch or missing hint
    pub fn position(&self) -> Option<&str> {
        match self {
            BindError::TypeMismatch { position, .. }
            | BindError::MissingTypeHint { position, .. }
            | BindError::IntOutOfRange { position, .. } => Some(position),
            _ => None,
        }
    }
}
