//! C ABI for native libraries built against this crate
//!
//! Every constructor returns an owned pointer. Every function that takes an
//! element, key or value pointer takes ownership of it, even when it reports
//! a failure status. `*_get` and `*_len` functions only borrow.
//!
//! # Safety
//!
//! Pointers passed in must be null or come from this module (or from a
//! `WireHandle::into_raw`) and must not have been freed.

use super::{DictDrain, WireDict, WireHandle, WireList, WireTuple, WireValue};
use crate::keys::{HashableKind, KeyCodec, WireKey};
use crate::value::HostKey;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Name of the version handshake symbol
pub const VERSION_SYMBOL: &str = "bindwire_abi_version";

const ABI_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Status codes returned by push/insert functions
pub const BINDWIRE_OK: u8 = 0;
pub const BINDWIRE_NULL: u8 = 1;
pub const BINDWIRE_WRONG_KIND: u8 = 2;
pub const BINDWIRE_BAD_KEY: u8 = 3;

unsafe fn borrow<'a>(value: *const WireValue) -> Option<&'a WireValue> {
    value.as_ref()
}

unsafe fn borrow_mut<'a>(value: *mut WireValue) -> Option<&'a mut WireValue> {
    value.as_mut()
}

/// Generator version of the runtime this library was built with
#[no_mangle]
pub extern "C" fn bindwire_abi_version() -> *const c_char {
    ABI_VERSION.as_ptr().cast()
}

/// Kind tag of a value, 0 for null
#[no_mangle]
pub unsafe extern "C" fn bindwire_kind(value: *const WireValue) -> u8 {
    borrow(value).map_or(0, |v| v.kind() as u8)
}

/// Free a value and everything it contains
#[no_mangle]
pub unsafe extern "C" fn bindwire_free(value: *mut WireValue) {
    drop(WireHandle::from_raw(value));
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_string_new(s: *const c_char) -> *mut WireValue {
    if s.is_null() {
        return ptr::null_mut();
    }
    let owned = CStr::from_ptr(s).to_owned();
    WireHandle::new(WireValue::String(owned)).into_raw()
}

/// Borrowed view of a string; valid until the value is freed
#[no_mangle]
pub unsafe extern "C" fn bindwire_string_get(value: *const WireValue) -> *const c_char {
    match borrow(value) {
        Some(WireValue::String(s)) => s.as_ptr(),
        _ => ptr::null(),
    }
}

#[no_mangle]
pub extern "C" fn bindwire_bool_new(b: u8) -> *mut WireValue {
    WireHandle::boolean(b != 0).into_raw()
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_bool_get(value: *const WireValue) -> u8 {
    match borrow(value) {
        Some(WireValue::Bool(b)) => u8::from(*b),
        _ => 0,
    }
}

#[no_mangle]
pub extern "C" fn bindwire_int_new(i: i64) -> *mut WireValue {
    WireHandle::int(i).into_raw()
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_int_get(value: *const WireValue) -> i64 {
    match borrow(value) {
        Some(WireValue::Int64(i)) => *i,
        _ => 0,
    }
}

#[no_mangle]
pub extern "C" fn bindwire_float32_new(f: f32) -> *mut WireValue {
    WireHandle::float32(f).into_raw()
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_float32_get(value: *const WireValue) -> f32 {
    match borrow(value) {
        Some(WireValue::Float32(f)) => *f,
        _ => 0.0,
    }
}

#[no_mangle]
pub extern "C" fn bindwire_float64_new(f: f64) -> *mut WireValue {
    WireHandle::float64(f).into_raw()
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_float64_get(value: *const WireValue) -> f64 {
    match borrow(value) {
        Some(WireValue::Float64(f)) => *f,
        _ => 0.0,
    }
}

#[no_mangle]
pub extern "C" fn bindwire_tuple_new() -> *mut WireValue {
    WireHandle::tuple(WireTuple::new()).into_raw()
}

/// Link `elem` at `idx` in front of the tuple's chain
#[no_mangle]
pub unsafe extern "C" fn bindwire_tuple_push(
    tuple: *mut WireValue,
    idx: usize,
    elem: *mut WireValue,
) -> u8 {
    let Some(elem) = WireHandle::from_raw(elem) else {
        return BINDWIRE_NULL;
    };
    match borrow_mut(tuple) {
        Some(WireValue::Tuple(t)) => {
            t.push_front(idx, elem);
            BINDWIRE_OK
        }
        Some(_) => BINDWIRE_WRONG_KIND,
        None => BINDWIRE_NULL,
    }
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_tuple_len(tuple: *const WireValue) -> usize {
    match borrow(tuple) {
        Some(WireValue::Tuple(t)) => t.len(),
        _ => 0,
    }
}

/// Remove and return the element at `idx`, null if absent
#[no_mangle]
pub unsafe extern "C" fn bindwire_tuple_take(tuple: *mut WireValue, idx: usize) -> *mut WireValue {
    match borrow_mut(tuple) {
        Some(WireValue::Tuple(t)) => t.take(idx).map_or(ptr::null_mut(), WireHandle::into_raw),
        _ => ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "C" fn bindwire_list_new(capacity: usize) -> *mut WireValue {
    WireHandle::list(WireList::with_capacity(capacity)).into_raw()
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_list_push(list: *mut WireValue, elem: *mut WireValue) -> u8 {
    let Some(elem) = WireHandle::from_raw(elem) else {
        return BINDWIRE_NULL;
    };
    match borrow_mut(list) {
        Some(WireValue::List(l)) => {
            l.push(elem);
            BINDWIRE_OK
        }
        Some(_) => BINDWIRE_WRONG_KIND,
        None => BINDWIRE_NULL,
    }
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_list_len(list: *const WireValue) -> usize {
    match borrow(list) {
        Some(WireValue::List(l)) => l.len(),
        _ => 0,
    }
}

/// Remove and return the last element, null when empty
#[no_mangle]
pub unsafe extern "C" fn bindwire_list_pop(list: *mut WireValue) -> *mut WireValue {
    match borrow_mut(list) {
        Some(WireValue::List(l)) => l.pop().map_or(ptr::null_mut(), WireHandle::into_raw),
        _ => ptr::null_mut(),
    }
}

/// New dictionary for a key code, null for an unknown code
#[no_mangle]
pub extern "C" fn bindwire_dict_new(key_code: u8) -> *mut WireValue {
    match HashableKind::from_code(key_code) {
        Some(kind) => WireHandle::dict(WireDict::new(kind)).into_raw(),
        None => ptr::null_mut(),
    }
}

fn key_from_wire(kind: HashableKind, key: WireValue) -> Option<WireKey> {
    // u64 keys travel as the i64 bit pattern in both directions
    if let (HashableKind::U64, WireValue::Int64(i)) = (kind, &key) {
        return Some(WireKey::U64(*i as u64));
    }
    let host = match key {
        WireValue::Int64(i) => HostKey::Int(i),
        WireValue::Bool(b) => HostKey::Bool(b),
        WireValue::String(s) => HostKey::Str(s.into_string().ok()?),
        _ => return None,
    };
    KeyCodec::for_kind(kind).encode(&host).ok()
}

fn key_to_wire(key: WireKey) -> WireHandle {
    match key {
        WireKey::I8(v) => WireHandle::int(v.into()),
        WireKey::I16(v) => WireHandle::int(v.into()),
        WireKey::I32(v) => WireHandle::int(v.into()),
        WireKey::I64(v) => WireHandle::int(v),
        WireKey::U8(v) => WireHandle::int(v.into()),
        WireKey::U16(v) => WireHandle::int(v.into()),
        WireKey::U32(v) => WireHandle::int(v.into()),
        WireKey::U64(v) => WireHandle::int(v as i64),
        WireKey::Bool(b) => WireHandle::boolean(b),
        WireKey::String(s) => {
            WireHandle::new(WireValue::String(CString::new(s).unwrap_or_default()))
        }
    }
}

/// Insert `value` under `key`; the key must fit the dictionary's key kind
#[no_mangle]
pub unsafe extern "C" fn bindwire_dict_insert(
    dict: *mut WireValue,
    key: *mut WireValue,
    value: *mut WireValue,
) -> u8 {
    let (Some(key), Some(value)) = (WireHandle::from_raw(key), WireHandle::from_raw(value)) else {
        return BINDWIRE_NULL;
    };
    let Some(WireValue::Dict(d)) = borrow_mut(dict) else {
        return if dict.is_null() {
            BINDWIRE_NULL
        } else {
            BINDWIRE_WRONG_KIND
        };
    };
    let Some(key) = key_from_wire(d.kind(), key.into_value()) else {
        return BINDWIRE_BAD_KEY;
    };
    match d.insert(key, value) {
        Ok(()) => BINDWIRE_OK,
        Err(_) => BINDWIRE_BAD_KEY,
    }
}

#[no_mangle]
pub unsafe extern "C" fn bindwire_dict_len(dict: *const WireValue) -> usize {
    match borrow(dict) {
        Some(WireValue::Dict(d)) => d.len(),
        _ => 0,
    }
}

/// Consume a dictionary into a drain; null (and the value freed) if it is not one
#[no_mangle]
pub unsafe extern "C" fn bindwire_dict_drain(dict: *mut WireValue) -> *mut DictDrain {
    let Some(handle) = WireHandle::from_raw(dict) else {
        return ptr::null_mut();
    };
    match handle.into_value() {
        WireValue::Dict(d) => {
            let kind = d.kind();
            d.drain(kind)
                .map_or(ptr::null_mut(), |drain| Box::into_raw(Box::new(drain)))
        }
        _ => ptr::null_mut(),
    }
}

/// Next entry: returns the owned value and stores the owned key in `key_out`
///
/// Returns null (and stores null) once the drain is exhausted.
#[no_mangle]
pub unsafe extern "C" fn bindwire_drain_next(
    drain: *mut DictDrain,
    key_out: *mut *mut WireValue,
) -> *mut WireValue {
    let entry = drain.as_mut().and_then(|d| d.next());
    let (key, value) = match entry {
        Some((k, v)) => (key_to_wire(k).into_raw(), v.into_raw()),
        None => (ptr::null_mut(), ptr::null_mut()),
    };
    if !key_out.is_null() {
        *key_out = key;
    } else if !key.is_null() {
        bindwire_free(key);
    }
    value
}

/// Free a drain and every entry it has not yielded
#[no_mangle]
pub unsafe extern "C" fn bindwire_drain_free(drain: *mut DictDrain) {
    if !drain.is_null() {
        drop(Box::from_raw(drain));
    }
}
