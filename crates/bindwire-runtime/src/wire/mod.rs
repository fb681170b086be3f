//! Wire value model
//!
//! Wire values are the only representation that crosses the call boundary.
//! Each lives on the heap behind a [`WireHandle`]; containers own their
//! element handles, so freeing a container frees everything inside it.
//!
//! # Safety
//!
//! A handle is moved into `decode` or into a container, so Rust code cannot
//! touch a consumed value. Native code sees raw pointers through [`abi`] and
//! must free each pointer it owns exactly once.

pub mod abi;
pub mod convert;
pub mod dict;
pub mod list;
pub mod stats;
pub mod tuple;
pub mod value;

pub use convert::{FromWire, IntoWire, WireKeyType};
pub use dict::{DictDrain, WireDict};
pub use list::WireList;
pub use stats::WireStats;
pub use tuple::WireTuple;
pub use value::{WireHandle, WireKind, WireValue};
