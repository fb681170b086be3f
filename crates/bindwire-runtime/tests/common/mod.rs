// Native side of the integration tests: `extern "C"` functions written against
// the wire C ABI or the typed conversions, exported through an in-process
// symbol table.

#![allow(dead_code)]

use bindwire_runtime::ffi::SymbolTable;
use bindwire_runtime::wire::abi::*;
use bindwire_runtime::{HashableKind, IntoWire, WireHandle, WireValue};
use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};

pub const DECLARATIONS: &[&str] = &[
    "python_bind_int1::type(i64);type(i64)",
    "python_bind_string1::type(String);type(String)",
    "python_bind_list1::type(WireList<String>);type(&mut i64);type(WireList<String>)",
    "python_bind_dict1::type(WireDict<u64, String>);type(WireDict<i64, String>)",
    "python_bind_counter::type(&mut i64);type()",
    "python_bind_tuple1::type(i64);type(Tuple(i64, String))",
    "python_bind_flagged_sum::type(List<Tuple(i64, bool)>);type(i64)",
    "python_bind_pairs::type(i64);type(List<Tuple(i64, String)>)",
    "python_bind_len::type(&WireList);type(i64)",
    "python_bind_scale::type(f32);type(f64)",
    "python_bind_keys::type(&WireDict);type(i64)",
    "python_bind_invert::type(WireDict<String, i64>);type(WireDict<i64, String>)",
    "python_bind_negate::type(i8);type(&mut i32);type(i32)",
];

unsafe fn read_string(value: *const WireValue) -> String {
    CStr::from_ptr(bindwire_string_get(value))
        .to_string_lossy()
        .into_owned()
}

unsafe fn new_string(s: &str) -> *mut WireValue {
    let s = CString::new(s).unwrap();
    bindwire_string_new(s.as_ptr())
}

pub extern "C" fn python_bind_int1(x: i64) -> i64 {
    x + 1
}

pub extern "C" fn python_bind_string1(s: *mut WireValue) -> *mut WireValue {
    unsafe {
        let text = read_string(s);
        bindwire_free(s);
        new_string(&format!("{} Added in Rust.", text))
    }
}

/// Reverses the list and counts the elements it moved
pub extern "C" fn python_bind_list1(list: *mut WireValue, moved: *mut i64) -> *mut WireValue {
    unsafe {
        let out = bindwire_list_new(bindwire_list_len(list));
        loop {
            let elem = bindwire_list_pop(list);
            if elem.is_null() {
                break;
            }
            assert_eq!(bindwire_list_push(out, elem), BINDWIRE_OK);
            *moved += 1;
        }
        bindwire_free(list);
        out
    }
}

/// Same keys, answering "From" with "Back" and "Python" with "Rust"
pub extern "C" fn python_bind_dict1(dict: *mut WireValue) -> *mut WireValue {
    unsafe {
        let out = bindwire_dict_new(HashableKind::I64.code());
        let drain = bindwire_dict_drain(dict);
        loop {
            let mut key = std::ptr::null_mut();
            let value = bindwire_drain_next(drain, &mut key);
            if value.is_null() {
                break;
            }
            let answer = match read_string(value).as_str() {
                "From" => "Back",
                "Python" => "Rust",
                other => panic!("unexpected value {other}"),
            };
            bindwire_free(value);
            assert_eq!(bindwire_dict_insert(out, key, new_string(answer)), BINDWIRE_OK);
        }
        bindwire_drain_free(drain);
        out
    }
}

pub extern "C" fn python_bind_counter(count: *mut i64) {
    unsafe { *count += 1 };
}

/// Takes ownership of a wire value the host moved in
fn adopt(value: *mut WireValue) -> WireHandle {
    unsafe { WireHandle::from_raw(value) }.unwrap()
}

pub extern "C" fn python_bind_tuple1(x: i64) -> *mut WireValue {
    (x * 2, "doubled").into_wire().unwrap().into_raw()
}

pub extern "C" fn python_bind_flagged_sum(list: *mut WireValue) -> i64 {
    let pairs: Vec<(i64, bool)> = adopt(list).extract().unwrap();
    pairs.iter().filter(|(_, flag)| *flag).map(|(n, _)| n).sum()
}

pub extern "C" fn python_bind_pairs(n: i64) -> *mut WireValue {
    let pairs: Vec<(i64, String)> = (0..n).map(|i| (i, i.to_string())).collect();
    pairs.into_wire().unwrap().into_raw()
}

/// Swaps keys and values
pub extern "C" fn python_bind_invert(dict: *mut WireValue) -> *mut WireValue {
    let words: HashMap<String, i64> = adopt(dict).extract().unwrap();
    let inverted: HashMap<i64, String> = words.into_iter().map(|(k, v)| (v, k)).collect();
    inverted.into_wire().unwrap().into_raw()
}

pub extern "C" fn python_bind_negate(x: i8, out: *mut i32) -> i32 {
    unsafe { *out = -i32::from(x) };
    -1
}

/// Borrows the list; the host frees it
pub extern "C" fn python_bind_len(list: *const WireValue) -> i64 {
    unsafe { bindwire_list_len(list) as i64 }
}

pub extern "C" fn python_bind_scale(x: f32) -> f64 {
    f64::from(x) * 1.5
}

pub extern "C" fn python_bind_keys(dict: *const WireValue) -> i64 {
    unsafe { bindwire_dict_len(dict) as i64 }
}

pub fn native_table() -> SymbolTable {
    unsafe {
        SymbolTable::new("native-tests")
            .with_version_symbol()
            .with("python_bind_int1", python_bind_int1 as *const c_void)
            .with("python_bind_string1", python_bind_string1 as *const c_void)
            .with("python_bind_list1", python_bind_list1 as *const c_void)
            .with("python_bind_dict1", python_bind_dict1 as *const c_void)
            .with("python_bind_counter", python_bind_counter as *const c_void)
            .with("python_bind_tuple1", python_bind_tuple1 as *const c_void)
            .with("python_bind_flagged_sum", python_bind_flagged_sum as *const c_void)
            .with("python_bind_pairs", python_bind_pairs as *const c_void)
            .with("python_bind_len", python_bind_len as *const c_void)
            .with("python_bind_scale", python_bind_scale as *const c_void)
            .with("python_bind_keys", python_bind_keys as *const c_void)
            .with("python_bind_invert", python_bind_invert as *const c_void)
            .with("python_bind_negate", python_bind_negate as *const c_void)
    }
}
