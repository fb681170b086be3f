//! Foreign Function Interface (FFI) infrastructure
//!
//! Calls native functions with structured arguments via:
//! - ABI slot declaration from parsed signatures (`types`)
//! - Dynamic calls through libffi (`caller`)
//! - Library loading and symbol lookup (`loader`)
//! - Function proxies with late type hints (`proxy`)
//!
//! # Safety
//!
//! FFI operations involve `unsafe` code and careful memory management.
//! Outside this module, `unsafe` appears only in [`crate::wire`]: the heap
//! cells behind `WireHandle` and the `extern "C"` functions in `wire::abi`.
//! Both sit behind safe wrappers. Binding a symbol trusts the scanner's
//! declaration to match the native function.

pub mod caller;
pub mod loader;
pub mod proxy;
pub mod types;

pub use caller::{ArgStorage, ForeignFunction};
pub use loader::{LoadError, NativeLibrary, SymbolSource, SymbolTable};
pub use proxy::{ArgOutput, CallOutput, FunctionProxy, ProxyState, RawArg, RawCall};
pub use types::{AbiSlot, AbiType, FunctionSignature};
