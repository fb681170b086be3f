//! Binding registry
//!
//! Builds one [`FunctionProxy`] per scanner declaration whose symbol carries a
//! binding prefix, keyed by the logical name (the symbol with the prefix
//! stripped).
//!
//! # Examples
//!
//! ```rust,no_run
//! # use bindwire_runtime::registry::{BindingRegistry, DeclarationManifest};
//! # use bindwire_runtime::ffi::NativeLibrary;
//! # use bindwire_runtime::value::HostValue;
//! # use std::sync::Arc;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let library = Arc::new(NativeLibrary::open("native")?);
//! let manifest = DeclarationManifest::load("bindings.txt")?;
//!
//! let mut registry = BindingRegistry::builder()
//!     .with_prefix("rust_bind_")
//!     .build(library, &manifest)?;
//!
//! registry
//!     .get_mut("list1")
//!     .expect("declared")
//!     .attach_arg_hint_str(0, "List<String>")?;
//! let out = registry.call("int1", &[HostValue::Int(1)])?;
//! assert_eq!(out, HostValue::Int(2));
//! # Ok(())
//! # }
//! ```

use crate::error::{BindError, BindResult};
use crate::ffi::loader::{LoadError, NativeLibrary};
use crate::ffi::proxy::{CallOutput, FunctionProxy};
use crate::signature::{parse_declaration, split_symbol};
use crate::value::HostValue;
use crate::wire::abi::VERSION_SYMBOL;
use bindwire_config::{BindingConfig, ConfigError, DEFAULT_PREFIX};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub use crate::ffi::loader::SymbolSource;

/// Declaration strings emitted by the source scanner
pub trait DeclarationSource {
    fn declarations(&self) -> Vec<&str>;
}

impl<S: AsRef<str>> DeclarationSource for [S] {
    fn declarations(&self) -> Vec<&str> {
        self.iter().map(AsRef::as_ref).collect()
    }
}

impl<S: AsRef<str>> DeclarationSource for Vec<S> {
    fn declarations(&self) -> Vec<&str> {
        self.as_slice().declarations()
    }
}

impl<S: AsRef<str>, const N: usize> DeclarationSource for [S; N] {
    fn declarations(&self) -> Vec<&str> {
        self.as_slice().declarations()
    }
}

/// Declaration file: one declaration per line, `#` starts a comment line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationManifest {
    path: Option<PathBuf>,
    lines: Vec<String>,
}

impl DeclarationManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::ManifestUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut manifest = Self::parse(&text);
        manifest.path = Some(path.to_path_buf());
        Ok(manifest)
    }

    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { path: None, lines }
    }

    /// File the manifest was read from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl DeclarationSource for DeclarationManifest {
    fn declarations(&self) -> Vec<&str> {
        self.lines.declarations()
    }
}

/// Builder for [`BindingRegistry`]
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    prefixes: Vec<String>,
    expected_version: Option<String>,
}

impl RegistryBuilder {
    /// Default prefix `python_bind_`, expecting this crate's version
    pub fn new() -> Self {
        Self {
            prefixes: vec![DEFAULT_PREFIX.to_string()],
            expected_version: Some(crate::VERSION.to_string()),
        }
    }

    /// Replace the binding prefixes; the first match wins
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Add one more binding prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Version the library must report
    pub fn expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = Some(version.into());
        self
    }

    /// Accept any library version
    pub fn skip_version_check(mut self) -> Self {
        self.expected_version = None;
        self
    }

    /// Check the library version, then bind every prefixed declaration
    pub fn build<D>(
        self,
        library: Arc<dyn SymbolSource>,
        declarations: &D,
    ) -> BindResult<BindingRegistry>
    where
        D: DeclarationSource + ?Sized,
    {
        self.check_version(library.as_ref())?;

        let mut functions = BTreeMap::new();
        for decl in declarations.declarations() {
            let (symbol, _) = split_symbol(decl).ok_or_else(|| BindError::unsupported(decl.trim()))?;
            let Some(name) = self.logical_name(symbol) else {
                debug!(symbol, "no binding prefix, skipped");
                continue;
            };
            if functions.contains_key(name) {
                return Err(BindError::DuplicateBinding(name.to_string()));
            }
            let proxy = FunctionProxy::bind(name, parse_declaration(decl)?, Arc::clone(&library))?;
            functions.insert(name.to_string(), proxy);
        }

        debug!(
            library = %library.describe(),
            functions = functions.len(),
            "registry built"
        );
        Ok(BindingRegistry { library, functions })
    }

    fn check_version(&self, library: &dyn SymbolSource) -> BindResult<()> {
        let Some(expected) = &self.expected_version else {
            return Ok(());
        };
        match library.version() {
            Some(found) if &found != expected => Err(BindError::VersionMismatch {
                expected: expected.clone(),
                found,
            }),
            Some(_) => Ok(()),
            None => {
                warn!(
                    library = %library.describe(),
                    "library does not export {}, version not checked", VERSION_SYMBOL
                );
                Ok(())
            }
        }
    }

    fn logical_name<'a>(&self, symbol: &'a str) -> Option<&'a str> {
        self.prefixes
            .iter()
            .find_map(|prefix| symbol.strip_prefix(prefix.as_str()))
            .filter(|name| !name.is_empty())
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Function proxies of one native library, by logical name
pub struct BindingRegistry {
    library: Arc<dyn SymbolSource>,
    functions: BTreeMap<String, FunctionProxy>,
}

impl BindingRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Open the configured library and bind its manifest
    pub fn from_config(config: &BindingConfig) -> BindResult<Self> {
        config.validate()?;
        let path = config.library_path().ok_or_else(|| {
            ConfigError::ValidationError("library.path is required".to_string())
        })?;
        let manifest_path = config.binding.declarations.as_ref().ok_or_else(|| {
            ConfigError::ValidationError("binding.declarations is required".to_string())
        })?;

        let library = NativeLibrary::open_with_search_paths(path, &config.library.search_paths)?;
        let manifest = DeclarationManifest::load(manifest_path)?;

        let mut builder = Self::builder().prefixes(config.binding.prefixes.iter().cloned());
        if let Some(version) = &config.binding.expected_version {
            builder = builder.expected_version(version.clone());
        }
        builder.build(Arc::new(library), &manifest)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionProxy> {
        self.functions.get(name)
    }

    /// Mutable access for attaching hints
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FunctionProxy> {
        self.functions.get_mut(name)
    }

    pub fn call(&self, name: &str, args: &[HostValue]) -> BindResult<HostValue> {
        self.proxy(name)?.call(args)
    }

    pub fn call_with_refs(&self, name: &str, args: &[HostValue]) -> BindResult<CallOutput> {
        self.proxy(name)?.call_with_refs(args)
    }

    fn proxy(&self, name: &str) -> BindResult<&FunctionProxy> {
        self.functions
            .get(name)
            .ok_or_else(|| BindError::UnknownFunction(name.to_string()))
    }

    /// Logical names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn library(&self) -> &dyn SymbolSource {
        self.library.as_ref()
    }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("library", &self.library.describe())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
