//! FFI function calling through libffi
//!
//! Signatures are only known at run time (and can change when hints are
//! attached), so calls go through a `Cif` built from the declared ABI slots
//! instead of transmuted function pointers.

use crate::error::BindResult;
use crate::ffi::types::{AbiSlot, AbiType, FunctionSignature};
use crate::marshal::RawReturn;
use crate::signature::IntWidth;
use crate::wire::WireHandle;
use libffi::middle::{Arg, Cif, CodePtr};
use std::ffi::c_void;

/// Argument value in stable storage for the duration of a call
///
/// Integers are stored at their declared width, so a pointer to the payload
/// is also a valid `*mut iN` for by-reference cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgStorage {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Pointer(*mut c_void),
}

impl ArgStorage {
    /// Host integer narrowed to `width`; out-of-range values are rejected
    pub fn int(width: IntWidth, value: i64) -> BindResult<Self> {
        let value = width.check(value)?;
        Ok(match width {
            IntWidth::I8 => ArgStorage::Int8(value as i8),
            IntWidth::I16 => ArgStorage::Int16(value as i16),
            IntWidth::I32 => ArgStorage::Int32(value as i32),
            IntWidth::I64 => ArgStorage::Int64(value),
            IntWidth::U8 => ArgStorage::UInt8(value as u8),
            IntWidth::U16 => ArgStorage::UInt16(value as u16),
            IntWidth::U32 => ArgStorage::UInt32(value as u32),
            IntWidth::U64 => ArgStorage::UInt64(value as u64),
        })
    }

    /// Pointer to the payload, for by-reference scalars
    pub(crate) fn payload_ptr(&mut self) -> *mut c_void {
        match self {
            ArgStorage::Int8(v) => (v as *mut i8).cast(),
            ArgStorage::Int16(v) => (v as *mut i16).cast(),
            ArgStorage::Int32(v) => (v as *mut i32).cast(),
            ArgStorage::Int64(v) => (v as *mut i64).cast(),
            ArgStorage::UInt8(v) => (v as *mut u8).cast(),
            ArgStorage::UInt16(v) => (v as *mut u16).cast(),
            ArgStorage::UInt32(v) => (v as *mut u32).cast(),
            ArgStorage::UInt64(v) => (v as *mut u64).cast(),
            ArgStorage::Float32(v) => (v as *mut f32).cast(),
            ArgStorage::Float64(v) => (v as *mut f64).cast(),
            ArgStorage::Pointer(v) => (v as *mut *mut c_void).cast(),
        }
    }

    fn as_arg(&self) -> Arg {
        match self {
            ArgStorage::Int8(v) => Arg::new(v),
            ArgStorage::Int16(v) => Arg::new(v),
            ArgStorage::Int32(v) => Arg::new(v),
            ArgStorage::Int64(v) => Arg::new(v),
            ArgStorage::UInt8(v) => Arg::new(v),
            ArgStorage::UInt16(v) => Arg::new(v),
            ArgStorage::UInt32(v) => Arg::new(v),
            ArgStorage::UInt64(v) => Arg::new(v),
            ArgStorage::Float32(v) => Arg::new(v),
            ArgStorage::Float64(v) => Arg::new(v),
            ArgStorage::Pointer(v) => Arg::new(v),
        }
    }
}

/// A native function with a prepared call interface
pub struct ForeignFunction {
    code: *const c_void,
    cif: Cif,
    ret: AbiSlot,
    arity: usize,
}

// Safety: the code pointer and the prepared `Cif` are never mutated after
// construction, and `ffi_call` only reads the `Cif`. Whether the native
// function itself tolerates concurrent calls is the library's contract.
unsafe impl Send for ForeignFunction {}
unsafe impl Sync for ForeignFunction {}

impl ForeignFunction {
    /// Prepare a call interface for `code`
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - `code` points to a valid `extern "C"` function
    /// - The function's actual signature matches the declared slots
    /// - The function remains valid for the lifetime of this ForeignFunction
    pub unsafe fn new(code: *const c_void, signature: &FunctionSignature) -> Self {
        let cif = Cif::new(
            signature.param_slots().iter().map(AbiSlot::ffi_type),
            signature.ret_slot().ffi_type(),
        );
        Self {
            code,
            cif,
            ret: signature.ret_slot(),
            arity: signature.arity(),
        }
    }

    pub fn code(&self) -> *const c_void {
        self.code
    }

    /// Call the function
    ///
    /// A returned wire pointer is adopted; a borrowed (`&`) wire return is
    /// reported as a plain pointer and never freed here.
    ///
    /// # Safety
    ///
    /// `args` must match the declared slots, and every pointer in it must be
    /// valid for what the native function does with it.
    pub unsafe fn invoke(&self, args: &[ArgStorage]) -> RawReturn {
        debug_assert_eq!(args.len(), self.arity);
        let ffi_args: Vec<Arg> = args.iter().map(ArgStorage::as_arg).collect();
        let code = CodePtr::from_ptr(self.code);

        match self.ret.ty {
            AbiType::Void => {
                self.cif.call::<()>(code, &ffi_args);
                RawReturn::Void
            }
            _ if self.ret.indirect => {
                RawReturn::Pointer(self.cif.call::<*mut c_void>(code, &ffi_args) as usize)
            }
            // libffi widens narrow integer returns to a full `ffi_arg` register
            AbiType::Int(width @ (IntWidth::I64 | IntWidth::U64)) => {
                RawReturn::Int(width.extend(self.cif.call::<u64>(code, &ffi_args)))
            }
            AbiType::Int(width) => {
                RawReturn::Int(width.extend(self.cif.call::<usize>(code, &ffi_args) as u64))
            }
            AbiType::Float32 => RawReturn::Float32(self.cif.call::<f32>(code, &ffi_args)),
            AbiType::Float64 => RawReturn::Float64(self.cif.call::<f64>(code, &ffi_args)),
            AbiType::Wire(_) => {
                let ptr = self.cif.call::<*mut c_void>(code, &ffi_args);
                RawReturn::Wire(WireHandle::from_raw(ptr.cast()))
            }
            AbiType::Pointer => RawReturn::Pointer(self.cif.call::<usize>(code, &ffi_args)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{parse_type, TypeSignature};
    use crate::value::HostValue;
    use crate::wire::WireValue;

    extern "C" fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    extern "C" fn scale(x: f32, by: f64) -> f64 {
        f64::from(x) * by
    }

    extern "C" fn bump(cell: *mut i64) {
        unsafe { *cell += 1 };
    }

    extern "C" fn minus_two(x: i32) -> i32 {
        x - 2
    }

    extern "C" fn low_byte(x: u16) -> u8 {
        (x & 0xff) as u8
    }

    extern "C" fn make_list(n: i64) -> *mut WireValue {
        let mut list = crate::wire::WireList::new();
        for i in 0..n {
            list.push(WireHandle::int(i));
        }
        WireHandle::list(list).into_raw()
    }

    fn function(code: *const c_void, params: &[&str], ret: &str) -> ForeignFunction {
        let params = params.iter().map(|p| parse_type(p).unwrap()).collect();
        let sig = FunctionSignature::new(params, parse_type(ret).unwrap());
        unsafe { ForeignFunction::new(code, &sig) }
    }

    #[test]
    fn test_call_by_value() {
        let f = function(add as *const c_void, &["i64", "i64"], "i64");
        let raw = unsafe { f.invoke(&[ArgStorage::Int64(40), ArgStorage::Int64(2)]) };
        assert!(matches!(raw, RawReturn::Int(42)));
    }

    #[test]
    fn test_narrow_int_return_is_sign_extended() {
        let f = function(minus_two as *const c_void, &["i32"], "i32");
        let arg = ArgStorage::int(IntWidth::I32, 1).unwrap();
        let raw = unsafe { f.invoke(&[arg]) };
        assert!(matches!(raw, RawReturn::Int(-1)));
    }

    #[test]
    fn test_unsigned_return_is_zero_extended() {
        let f = function(low_byte as *const c_void, &["u16"], "u8");
        let arg = ArgStorage::int(IntWidth::U16, 0x1ff).unwrap();
        let raw = unsafe { f.invoke(&[arg]) };
        assert!(matches!(raw, RawReturn::Int(255)));
    }

    #[test]
    fn test_int_storage_range_checked() {
        assert_eq!(
            ArgStorage::int(IntWidth::I8, -128).unwrap(),
            ArgStorage::Int8(-128)
        );
        assert!(ArgStorage::int(IntWidth::U32, -1).is_err());
        assert!(ArgStorage::int(IntWidth::I16, 40_000).is_err());
    }

    #[test]
    fn test_call_mixed_floats() {
        let f = function(scale as *const c_void, &["f32", "f64"], "f64");
        let raw = unsafe { f.invoke(&[ArgStorage::Float32(1.5), ArgStorage::Float64(2.0)]) };
        assert!(matches!(raw, RawReturn::Float64(v) if v == 3.0));
    }

    #[test]
    fn test_call_with_cell() {
        let f = function(bump as *const c_void, &["&mut i64"], "()");
        let mut cell = Box::new(41i64);
        let ptr: *mut i64 = &mut *cell;
        let raw = unsafe { f.invoke(&[ArgStorage::Pointer(ptr.cast())]) };
        assert!(matches!(raw, RawReturn::Void));
        assert_eq!(*cell, 42);
    }

    #[test]
    fn test_wire_return_adopted() {
        let f = function(make_list as *const c_void, &["i64"], "List<i64>");
        let raw = unsafe { f.invoke(&[ArgStorage::Int64(3)]) };
        let value = crate::marshal::decode_return(raw, &TypeSignature::list(TypeSignature::int()));
        assert_eq!(value.unwrap(), HostValue::from(vec![0i64, 1, 2]));
    }
}
