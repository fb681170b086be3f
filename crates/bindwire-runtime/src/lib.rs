//! bindwire runtime - typed value marshaling across a C call boundary
//!
//! This library moves structured values between a dynamically-typed host and a
//! natively-compiled library:
//! - Signature grammar for the scanner's declaration strings
//! - Boundary-owned wire values with a C ABI for native code
//! - Encoding host values to wire values and decoding them back
//! - Function proxies that encode, call through libffi and decode
//! - A registry of proxies discovered by symbol prefix

/// bindwire runtime version, also the expected generator version of native libraries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod ffi;
pub mod keys;
pub mod logging;
pub mod marshal;
pub mod registry;
pub mod signature;
pub mod value;
pub mod wire;

pub use error::{BindError, BindResult};
pub use ffi::{AbiSlot, AbiType, CallOutput, FunctionProxy, FunctionSignature, RawCall};
pub use keys::{HashableKind, KeyCodec};
pub use marshal::{decode, decode_return, encode, RawReturn};
pub use registry::{BindingRegistry, DeclarationManifest, DeclarationSource, SymbolSource};
pub use signature::{
    parse_declaration, parse_type, Access, IntWidth, RawDeclaration, Shape, TypeSignature,
};
pub use value::{HostKey, HostValue};
pub use wire::{FromWire, IntoWire, WireHandle, WireKind, WireValue};
