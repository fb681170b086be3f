//! Typed conversions for native code written in Rust
//!
//! Native functions receive raw wire pointers. Adopting one with
//! [`WireHandle::from_raw`] and calling [`WireHandle::extract`] unpacks it
//! into ordinary Rust types; [`IntoWire`] goes the other way:
//!
//! ```rust,no_run
//! use bindwire_runtime::wire::{IntoWire, WireHandle, WireValue};
//!
//! #[no_mangle]
//! pub extern "C" fn python_bind_rows(rows: *mut WireValue) -> *mut WireValue {
//!     let rows: Vec<(i64, String)> = unsafe { WireHandle::from_raw(rows) }
//!         .and_then(|h| h.extract().ok())
//!         .unwrap_or_default();
//!     let lengths: Vec<i64> = rows.iter().map(|(_, s)| s.len() as i64).collect();
//!     lengths
//!         .into_wire()
//!         .map_or(std::ptr::null_mut(), WireHandle::into_raw)
//! }
//! ```
//!
//! Integers are range-checked against the Rust type, and errors carry the same
//! position paths as host decoding.

use super::{WireDict, WireHandle, WireList, WireTuple, WireValue};
use crate::error::{BindError, BindResult};
use crate::keys::{HashableKind, WireKey};
use crate::signature::IntWidth;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Rust value that can be moved into a wire value
pub trait IntoWire {
    fn into_wire(self) -> BindResult<WireHandle>;
}

/// Rust value that can be unpacked from a wire value, consuming it
pub trait FromWire: Sized {
    fn from_wire(handle: WireHandle) -> BindResult<Self>;
}

/// Rust type usable as a wire dictionary key
pub trait WireKeyType: Sized {
    const KIND: HashableKind;

    fn into_key(self) -> WireKey;

    fn from_key(key: WireKey) -> BindResult<Self>;
}

impl WireHandle {
    /// Consume the handle into a Rust value
    pub fn extract<T: FromWire>(self) -> BindResult<T> {
        T::from_wire(self)
    }
}

impl IntoWire for WireHandle {
    fn into_wire(self) -> BindResult<WireHandle> {
        Ok(self)
    }
}

impl FromWire for WireHandle {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        Ok(handle)
    }
}

macro_rules! wire_int {
    ($($ty:ty => $width:ident),* $(,)?) => {$(
        impl IntoWire for $ty {
            fn into_wire(self) -> BindResult<WireHandle> {
                Ok(WireHandle::int(i64::from(self)))
            }
        }

        impl FromWire for $ty {
            fn from_wire(handle: WireHandle) -> BindResult<Self> {
                match handle.into_value() {
                    WireValue::Int64(i) => Ok(IntWidth::$width.check(i)? as $ty),
                    other => Err(BindError::mismatch(stringify!($ty), other.kind())),
                }
            }
        }
    )*};
}

wire_int!(i8 => I8, i16 => I16, i32 => I32, i64 => I64, u8 => U8, u16 => U16, u32 => U32);

impl IntoWire for u64 {
    fn into_wire(self) -> BindResult<WireHandle> {
        i64::try_from(self)
            .map(WireHandle::int)
            .map_err(|_| BindError::int_out_of_range(IntWidth::U64, self.to_string()))
    }
}

impl FromWire for u64 {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::Int64(i) => Ok(IntWidth::U64.check(i)? as u64),
            other => Err(BindError::mismatch("u64", other.kind())),
        }
    }
}

impl IntoWire for f32 {
    fn into_wire(self) -> BindResult<WireHandle> {
        Ok(WireHandle::float32(self))
    }
}

impl FromWire for f32 {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::Float32(f) => Ok(f),
            other => Err(BindError::mismatch("f32", other.kind())),
        }
    }
}

impl IntoWire for f64 {
    fn into_wire(self) -> BindResult<WireHandle> {
        Ok(WireHandle::float64(self))
    }
}

impl FromWire for f64 {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::Float64(f) => Ok(f),
            other => Err(BindError::mismatch("f64", other.kind())),
        }
    }
}

impl IntoWire for bool {
    fn into_wire(self) -> BindResult<WireHandle> {
        Ok(WireHandle::boolean(self))
    }
}

impl FromWire for bool {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::Bool(b) => Ok(b),
            other => Err(BindError::mismatch("bool", other.kind())),
        }
    }
}

impl IntoWire for &str {
    fn into_wire(self) -> BindResult<WireHandle> {
        WireHandle::string(self)
    }
}

impl IntoWire for String {
    fn into_wire(self) -> BindResult<WireHandle> {
        WireHandle::string(&self)
    }
}

impl FromWire for String {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::String(s) => s
                .into_string()
                .map_err(|e| BindError::InvalidString(e.to_string())),
            other => Err(BindError::mismatch("String", other.kind())),
        }
    }
}

impl WireList {
    /// Build a list from Rust values, in order
    pub fn from_values<T: IntoWire>(values: impl IntoIterator<Item = T>) -> BindResult<Self> {
        let values = values.into_iter();
        let mut list = WireList::with_capacity(values.size_hint().0);
        for (idx, value) in values.enumerate() {
            list.push(value.into_wire().map_err(|e| e.at_index(idx))?);
        }
        Ok(list)
    }

    /// Pop the last element as a Rust value
    pub fn pop_as<T: FromWire>(&mut self) -> Option<BindResult<T>> {
        self.pop().map(T::from_wire)
    }

    /// Consume the list into Rust values, in order
    pub fn into_vec<T: FromWire>(mut self) -> BindResult<Vec<T>> {
        let mut idx = self.len();
        let mut out = VecDeque::with_capacity(idx);
        while let Some(elem) = self.pop() {
            idx -= 1;
            out.push_front(T::from_wire(elem).map_err(|e| e.at_index(idx))?);
        }
        Ok(out.into())
    }
}

impl<T: IntoWire> IntoWire for Vec<T> {
    fn into_wire(self) -> BindResult<WireHandle> {
        WireList::from_values(self).map(WireHandle::list)
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::List(list) => list.into_vec(),
            other => Err(BindError::mismatch("WireList", other.kind())),
        }
    }
}

impl WireTuple {
    /// Unlink element `idx` as a Rust value
    pub fn take_as<T: FromWire>(&mut self, idx: usize) -> BindResult<T> {
        let elem = self.take(idx).ok_or_else(|| {
            BindError::mismatch(format!("element {}", idx), "missing element").at_index(idx)
        })?;
        T::from_wire(elem).map_err(|e| e.at_index(idx))
    }
}

macro_rules! wire_tuple {
    ($len:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: IntoWire),+> IntoWire for ($($name,)+) {
            fn into_wire(self) -> BindResult<WireHandle> {
                let elems = [$(self.$idx.into_wire().map_err(|e| e.at_index($idx))?),+];
                Ok(WireHandle::tuple(elems.into_iter().collect()))
            }
        }

        impl<$($name: FromWire),+> FromWire for ($($name,)+) {
            fn from_wire(handle: WireHandle) -> BindResult<Self> {
                let mut tuple = match handle.into_value() {
                    WireValue::Tuple(tuple) if tuple.len() == $len => tuple,
                    WireValue::Tuple(tuple) => {
                        return Err(BindError::mismatch(
                            format!("tuple of {}", $len),
                            format!("tuple of {}", tuple.len()),
                        ))
                    }
                    other => return Err(BindError::mismatch("WireTuple", other.kind())),
                };
                Ok(($(tuple.take_as::<$name>($idx)?,)+))
            }
        }
    };
}

wire_tuple!(1; A 0);
wire_tuple!(2; A 0, B 1);
wire_tuple!(3; A 0, B 1, C 2);
wire_tuple!(4; A 0, B 1, C 2, D 3);

macro_rules! wire_key {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl WireKeyType for $ty {
            const KIND: HashableKind = HashableKind::$variant;

            fn into_key(self) -> WireKey {
                WireKey::$variant(self)
            }

            fn from_key(key: WireKey) -> BindResult<Self> {
                match key {
                    WireKey::$variant(k) => Ok(k),
                    other => Err(BindError::mismatch(Self::KIND, other.kind()).within(".key")),
                }
            }
        }
    )*};
}

wire_key!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    bool => Bool,
    String => String,
);

impl WireDict {
    /// Build a dictionary keyed by `K`'s kind
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> BindResult<Self>
    where
        K: WireKeyType,
        V: IntoWire,
    {
        let entries = entries.into_iter();
        let mut dict = WireDict::with_capacity(K::KIND, entries.size_hint().0);
        for (key, value) in entries {
            let value = value.into_wire().map_err(|e| e.within(".value"))?;
            dict.insert(key.into_key(), value)?;
        }
        Ok(dict)
    }

    /// Consume the dictionary into a map; its kind must be `K`'s
    pub fn into_map<K, V>(self) -> BindResult<HashMap<K, V>>
    where
        K: WireKeyType + Eq + Hash,
        V: FromWire,
    {
        self.drain(K::KIND)?
            .map(|(key, value)| {
                let value = V::from_wire(value).map_err(|e| e.within(".value"))?;
                Ok((K::from_key(key)?, value))
            })
            .collect()
    }
}

impl<K, V> IntoWire for HashMap<K, V>
where
    K: WireKeyType,
    V: IntoWire,
{
    fn into_wire(self) -> BindResult<WireHandle> {
        WireDict::from_entries(self).map(WireHandle::dict)
    }
}

impl<K, V> FromWire for HashMap<K, V>
where
    K: WireKeyType + Eq + Hash,
    V: FromWire,
{
    fn from_wire(handle: WireHandle) -> BindResult<Self> {
        match handle.into_value() {
            WireValue::Dict(dict) => dict.into_map(),
            other => Err(BindError::mismatch("WireDict", other.kind())),
        }
    }
}
