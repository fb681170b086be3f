//! Tagged wire values and the owning handle

use super::stats;
use super::{WireDict, WireList, WireTuple};
use crate::error::{BindError, BindResult};
use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr::NonNull;
use tracing::trace;

/// Explicit tag of a wire value, as reported by `bindwire_kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireKind {
    String = 1,
    Bool = 2,
    Int64 = 3,
    Float32 = 4,
    Float64 = 5,
    Tuple = 6,
    List = 7,
    Dict = 8,
}

impl WireKind {
    pub fn name(self) -> &'static str {
        match self {
            WireKind::String => "WireString",
            WireKind::Bool => "WireBool",
            WireKind::Int64 => "i64",
            WireKind::Float32 => "f32",
            WireKind::Float64 => "f64",
            WireKind::Tuple => "WireTuple",
            WireKind::List => "WireList",
            WireKind::Dict => "WireDict",
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A boundary-owned value
#[derive(Debug)]
pub enum WireValue {
    String(CString),
    Bool(bool),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Tuple(WireTuple),
    List(WireList),
    Dict(WireDict),
}

impl WireValue {
    pub fn kind(&self) -> WireKind {
        match self {
            WireValue::String(_) => WireKind::String,
            WireValue::Bool(_) => WireKind::Bool,
            WireValue::Int64(_) => WireKind::Int64,
            WireValue::Float32(_) => WireKind::Float32,
            WireValue::Float64(_) => WireKind::Float64,
            WireValue::Tuple(_) => WireKind::Tuple,
            WireValue::List(_) => WireKind::List,
            WireValue::Dict(_) => WireKind::Dict,
        }
    }
}

/// Owning pointer to a heap-allocated wire value
///
/// Dropping the handle frees the value and everything it contains.
/// `into_raw` hands ownership to native code; `from_raw` takes it back.
pub struct WireHandle {
    ptr: NonNull<WireValue>,
}

// Safety: the handle is the unique owner of its allocation
unsafe impl Send for WireHandle {}

impl WireHandle {
    /// Move a value onto the heap
    pub fn new(value: WireValue) -> Self {
        stats::record_alloc();
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        Self { ptr }
    }

    /// New string value; interior NUL bytes are rejected
    pub fn string(s: &str) -> BindResult<Self> {
        let c = CString::new(s).map_err(|e| BindError::InvalidString(e.to_string()))?;
        Ok(Self::new(WireValue::String(c)))
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(WireValue::Bool(b))
    }

    pub fn int(i: i64) -> Self {
        Self::new(WireValue::Int64(i))
    }

    pub fn float32(f: f32) -> Self {
        Self::new(WireValue::Float32(f))
    }

    pub fn float64(f: f64) -> Self {
        Self::new(WireValue::Float64(f))
    }

    pub fn tuple(tuple: WireTuple) -> Self {
        Self::new(WireValue::Tuple(tuple))
    }

    pub fn list(list: WireList) -> Self {
        Self::new(WireValue::List(list))
    }

    pub fn dict(dict: WireDict) -> Self {
        Self::new(WireValue::Dict(dict))
    }

    pub fn kind(&self) -> WireKind {
        self.value().kind()
    }

    pub fn value(&self) -> &WireValue {
        // Safety: ptr came from Box::leak and is uniquely owned by self
        unsafe { self.ptr.as_ref() }
    }

    pub fn value_mut(&mut self) -> &mut WireValue {
        // Safety: as in `value`, and &mut self guarantees exclusivity
        unsafe { self.ptr.as_mut() }
    }

    /// String contents, if this is a string value
    pub fn as_c_str(&self) -> Option<&CStr> {
        match self.value() {
            WireValue::String(s) => Some(s.as_c_str()),
            _ => None,
        }
    }

    /// Pointer handed to native code while the handle keeps ownership
    pub fn as_ptr(&self) -> *mut WireValue {
        self.ptr.as_ptr()
    }

    /// Give up ownership; the pointer must come back through `from_raw`
    pub fn into_raw(self) -> *mut WireValue {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    /// Adopt a pointer produced by `into_raw` (here or in native code)
    ///
    /// Returns `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or an owned wire value pointer that nothing else
    /// will free or use afterwards.
    pub unsafe fn from_raw(ptr: *mut WireValue) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Unwrap the value, freeing the heap cell
    pub fn into_value(self) -> WireValue {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        stats::record_free();
        // Safety: ptr came from Box::leak and ownership was just released
        *unsafe { Box::from_raw(ptr) }
    }
}

impl Drop for WireHandle {
    fn drop(&mut self) {
        stats::record_free();
        // Safety: ptr came from Box::leak and is dropped exactly once
        let value = unsafe { Box::from_raw(self.ptr.as_ptr()) };
        trace!(kind = %value.kind(), "free wire value");
    }
}

impl fmt::Debug for WireHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WireHandle").field(self.value()).finish()
    }
}
