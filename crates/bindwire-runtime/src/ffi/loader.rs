//! Dynamic library loading for FFI
//!
//! Provides cross-platform dynamic library loading using `libloading`, plus an
//! in-process symbol table for statically linked natives.
//! Handles platform-specific library naming conventions and search paths.

use crate::wire::abi::VERSION_SYMBOL;
use libloading::{Library, Symbol};
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Library loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Library file not found in search paths
    #[error("Library not found: {0}")]
    LibraryNotFound(String),
    /// Symbol not found in library
    #[error("Symbol '{symbol}' not found in library '{library}'")]
    SymbolNotFound { library: String, symbol: String },
    /// Failed to load library
    #[error("Failed to load library: {0}")]
    LoadFailed(String),
    /// Declaration manifest could not be read
    #[error("Failed to read declarations from {path}: {reason}")]
    ManifestUnreadable { path: PathBuf, reason: String },
}

/// Where function pointers come from
///
/// Sources are shared by every proxy bound from them, across threads.
pub trait SymbolSource: Send + Sync {
    /// Address of an exported function
    fn symbol(&self, name: &str) -> Result<*const c_void, LoadError>;

    /// Generator version reported through `bindwire_abi_version`, if exported
    fn version(&self) -> Option<String> {
        let ptr = self.symbol(VERSION_SYMBOL).ok()?;
        // Safety: the symbol is the runtime's own `extern "C" fn() -> *const c_char`
        let version: extern "C" fn() -> *const c_char = unsafe { std::mem::transmute(ptr) };
        let raw = version();
        if raw.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
    }

    /// Human-readable name for logs and errors
    fn describe(&self) -> String;
}

/// Resolves short library names to files with platform-specific naming
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    search_paths: Vec<PathBuf>,
}

impl LibraryResolver {
    /// Create a resolver with default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
        }
    }

    /// Resolver that only searches `paths`, in order
    pub fn with_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            search_paths: paths.into_iter().collect(),
        }
    }

    /// Working directory, then the loader path variable, then system directories
    ///
    /// Native binding libraries usually sit next to the host's working
    /// directory or are made visible through `LD_LIBRARY_PATH` (`DYLD_LIBRARY_PATH`
    /// on macOS, `PATH` on Windows).
    fn default_search_paths() -> Vec<PathBuf> {
        let var = if cfg!(target_os = "windows") {
            "PATH"
        } else if cfg!(target_os = "macos") {
            "DYLD_LIBRARY_PATH"
        } else {
            "LD_LIBRARY_PATH"
        };
        let system: &[&str] = if cfg!(target_os = "windows") {
            &[]
        } else {
            &["/usr/local/lib", "/usr/lib"]
        };

        std::env::current_dir()
            .into_iter()
            .chain(
                std::env::var_os(var)
                    .map(|value| std::env::split_paths(&value).collect::<Vec<_>>())
                    .unwrap_or_default(),
            )
            .chain(system.iter().map(PathBuf::from))
            .collect()
    }

    /// Add a custom search path (prepended to search list)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolve library name to full path with platform-specific naming
    ///
    /// - Linux: lib{name}.so
    /// - macOS: lib{name}.dylib or lib{name}.so
    /// - Windows: {name}.dll
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        // Explicit paths are used as given
        let path = Path::new(name);
        if (path.is_absolute() || path.components().count() > 1) && path.is_file() {
            return Some(path.to_path_buf());
        }

        let extensions: &[&str] = if cfg!(target_os = "windows") {
            &["dll"]
        } else if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else {
            &["so"]
        };

        let prefixes: &[&str] = if cfg!(target_os = "windows") {
            &["", "lib"]
        } else {
            &["lib", ""]
        };

        for search_path in &self.search_paths {
            // Full file names such as `libnative.so`
            let exact = search_path.join(name);
            if path.extension().is_some() && exact.is_file() {
                return Some(exact);
            }
            for prefix in prefixes {
                for ext in extensions {
                    let full_path = search_path.join(format!("{}{}.{}", prefix, name, ext));
                    if full_path.is_file() {
                        return Some(full_path);
                    }
                }
            }
        }

        None
    }
}

impl Default for LibraryResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A loaded shared library
///
/// # Safety
///
/// Loading a dynamic library executes its initialization code and makes its
/// symbols callable. The library must be trusted.
pub struct NativeLibrary {
    path: PathBuf,
    library: Library,
}

impl NativeLibrary {
    /// Load a library by short name or path using the default search paths
    pub fn open(name: &str) -> Result<Self, LoadError> {
        Self::open_with_search_paths(name, &[])
    }

    /// Load a library, searching `extra` directories first
    pub fn open_with_search_paths(name: &str, extra: &[PathBuf]) -> Result<Self, LoadError> {
        let mut resolver = LibraryResolver::new();
        for path in extra.iter().rev() {
            resolver.add_search_path(path.clone());
        }
        let path = resolver
            .resolve(name)
            .ok_or_else(|| LoadError::LibraryNotFound(name.to_string()))?;

        let library =
            unsafe { Library::new(&path).map_err(|e| LoadError::LoadFailed(e.to_string()))? };
        debug!(path = %path.display(), "loaded native library");
        Ok(Self { path, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolSource for NativeLibrary {
    fn symbol(&self, name: &str) -> Result<*const c_void, LoadError> {
        // Safety: only the address is read; callers declare the signature
        let symbol: Symbol<'_, *const c_void> = unsafe { self.library.get(name.as_bytes()) }
            .map_err(|_| LoadError::SymbolNotFound {
                library: self.describe(),
                symbol: name.to_string(),
            })?;
        Ok(*symbol)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process symbol table
///
/// For natives linked into the host binary, and for tests.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    name: String,
    symbols: HashMap<String, *const c_void>,
}

// Safety: the table only stores function addresses, which are never written through
unsafe impl Send for SymbolTable {}
unsafe impl Sync for SymbolTable {}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashMap::new(),
        }
    }

    /// Register a function pointer under `name`
    ///
    /// # Safety
    ///
    /// `ptr` must be an `extern "C"` function that stays valid while the table
    /// is in use, with the signature its declaration claims.
    pub unsafe fn insert(&mut self, name: impl Into<String>, ptr: *const c_void) {
        self.symbols.insert(name.into(), ptr);
    }

    /// Builder form of [`SymbolTable::insert`]
    ///
    /// # Safety
    ///
    /// As for [`SymbolTable::insert`].
    pub unsafe fn with(mut self, name: impl Into<String>, ptr: *const c_void) -> Self {
        self.insert(name, ptr);
        self
    }

    /// Export the runtime's version symbol from this table
    pub fn with_version_symbol(mut self) -> Self {
        let ptr = crate::wire::abi::bindwire_abi_version as *const c_void;
        self.symbols.insert(VERSION_SYMBOL.to_string(), ptr);
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolSource for SymbolTable {
    fn symbol(&self, name: &str) -> Result<*const c_void, LoadError> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::SymbolNotFound {
                library: self.name.clone(),
                symbol: name.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
