//! Function proxies
//!
//! A proxy pairs one foreign symbol with its declared signature. It starts
//! `Declared` with the scanner's types; attaching a hint narrows one position
//! and moves it to `Refined`. Calls encode every argument before the foreign
//! function runs, so a failing argument never reaches native code and leaves
//! nothing allocated.

use crate::error::{BindError, BindResult};
use crate::ffi::caller::{ArgStorage, ForeignFunction};
use crate::ffi::loader::SymbolSource;
use crate::ffi::types::FunctionSignature;
use crate::marshal::{decode, decode_return, encode, RawReturn};
use crate::signature::{
    parse_type, Access, IntWidth, PrimitiveKind, RawDeclaration, Shape, TypeSignature,
};
use crate::value::HostValue;
use crate::wire::WireHandle;
use std::ffi::c_void;
use std::fmt;
use std::ptr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Signature exactly as declared
    Declared,
    /// At least one position narrowed by a hint
    Refined,
}

/// What happened to one argument, read back after the call
#[derive(Debug, Clone, PartialEq)]
pub enum ArgOutput {
    /// Passed by value; nothing to read back
    ByValue,
    /// Ownership moved to the foreign function
    Moved,
    /// Contents of a by-reference argument after the call
    ReadBack(HostValue),
}

/// Decoded return value plus by-reference argument contents
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutput {
    pub ret: HostValue,
    pub args: Vec<ArgOutput>,
}

/// Undecoded argument state after a call
#[derive(Debug)]
pub enum RawArg {
    ByValue,
    Moved,
    /// Scalar cell contents as the foreign function left them
    Cell(ArgStorage),
    /// Wire value the host kept across the call; freed on drop
    Borrowed(WireHandle),
}

/// Undecoded result of a call
#[derive(Debug)]
pub struct RawCall {
    pub ret: RawReturn,
    pub args: Vec<RawArg>,
}

/// Host-owned storage a by-reference scalar points at
///
/// Sized to the declared width, so a native `*mut i32` writes exactly the
/// four bytes that are read back.
#[derive(Debug)]
struct ScalarCell(Box<ArgStorage>);

impl ScalarCell {
    fn new(storage: ArgStorage) -> Self {
        Self(Box::new(storage))
    }

    fn as_mut_ptr(&mut self) -> *mut c_void {
        self.0.payload_ptr()
    }

    fn read(&self) -> BindResult<HostValue> {
        Ok(match *self.0 {
            ArgStorage::Int8(v) => HostValue::Int(v.into()),
            ArgStorage::Int16(v) => HostValue::Int(v.into()),
            ArgStorage::Int32(v) => HostValue::Int(v.into()),
            ArgStorage::Int64(v) => HostValue::Int(v),
            ArgStorage::UInt8(v) => HostValue::Int(v.into()),
            ArgStorage::UInt16(v) => HostValue::Int(v.into()),
            ArgStorage::UInt32(v) => HostValue::Int(v.into()),
            ArgStorage::UInt64(v) => HostValue::Int(IntWidth::U64.from_abi(v as i64)?),
            ArgStorage::Float32(v) => HostValue::Float(f64::from(v)),
            ArgStorage::Float64(v) => HostValue::Float(v),
            ArgStorage::Pointer(p) => HostValue::Int(p as usize as i64),
        })
    }
}

/// One argument ready to be passed
#[derive(Debug)]
enum Prepared {
    Direct(ArgStorage),
    Cell(ScalarCell),
    Borrowed(WireHandle),
    /// Released to the foreign side when the call is made
    Owned(Option<WireHandle>),
}

impl Prepared {
    fn storage(&mut self) -> ArgStorage {
        match self {
            Prepared::Direct(storage) => *storage,
            Prepared::Cell(cell) => ArgStorage::Pointer(cell.as_mut_ptr()),
            Prepared::Borrowed(handle) => ArgStorage::Pointer(handle.as_ptr().cast()),
            Prepared::Owned(slot) => ArgStorage::Pointer(
                slot.take()
                    .map_or(ptr::null_mut(), |handle| handle.into_raw().cast()),
            ),
        }
    }

    fn read_back(self, sig: &TypeSignature) -> BindResult<ArgOutput> {
        Ok(match self {
            Prepared::Direct(_) => ArgOutput::ByValue,
            Prepared::Owned(_) => ArgOutput::Moved,
            Prepared::Cell(cell) => ArgOutput::ReadBack(cell.read()?),
            Prepared::Borrowed(handle) => ArgOutput::ReadBack(decode(handle, sig)?),
        })
    }

    fn into_raw_arg(self) -> RawArg {
        match self {
            Prepared::Direct(_) => RawArg::ByValue,
            Prepared::Owned(_) => RawArg::Moved,
            Prepared::Cell(cell) => RawArg::Cell(*cell.0),
            Prepared::Borrowed(handle) => RawArg::Borrowed(handle),
        }
    }
}

/// Callable wrapper around one bound foreign function
pub struct FunctionProxy {
    name: String,
    symbol: String,
    signature: FunctionSignature,
    function: ForeignFunction,
    state: ProxyState,
    library: Arc<dyn SymbolSource>,
}

impl FunctionProxy {
    /// Resolve `declaration.symbol` in `library` and declare its slots
    ///
    /// `name` is the logical name the host calls the function by.
    pub fn bind(
        name: impl Into<String>,
        declaration: RawDeclaration,
        library: Arc<dyn SymbolSource>,
    ) -> BindResult<Self> {
        let code = library.symbol(&declaration.symbol)?;
        let signature = FunctionSignature::new(declaration.params, declaration.ret);
        // Safety: the declaration describes the exported function
        let function = unsafe { ForeignFunction::new(code, &signature) };
        let name = name.into();
        debug!(function = %name, symbol = %declaration.symbol, signature = %signature, "bound");

        Ok(Self {
            name,
            symbol: declaration.symbol,
            signature,
            function,
            state: ProxyState::Declared,
            library,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    /// Library the symbol was resolved in
    pub fn library(&self) -> &dyn SymbolSource {
        self.library.as_ref()
    }

    /// Narrow parameter `position` with a host-supplied type
    ///
    /// The declared access modifier is kept. On error the proxy is unchanged.
    pub fn attach_arg_hint(&mut self, position: usize, hint: TypeSignature) -> BindResult<()> {
        let declared = self.signature.params().get(position).ok_or_else(|| {
            BindError::mismatch(
                format!("parameter index below {}", self.signature.arity()),
                position,
            )
        })?;
        let refined = declared
            .refine_with(&hint)
            .map_err(|e| e.within(&format!("arg{}", position)))?;
        let signature = self.signature.with_param(position, refined);
        self.redeclare(signature);
        Ok(())
    }

    /// Narrow the return type with a host-supplied type
    pub fn attach_return_hint(&mut self, hint: TypeSignature) -> BindResult<()> {
        let refined = self
            .signature
            .ret()
            .refine_with(&hint)
            .map_err(|e| e.within("return"))?;
        let signature = self.signature.with_ret(refined);
        self.redeclare(signature);
        Ok(())
    }

    /// [`attach_arg_hint`](Self::attach_arg_hint) with a type in declaration syntax
    pub fn attach_arg_hint_str(&mut self, position: usize, hint: &str) -> BindResult<()> {
        self.attach_arg_hint(position, parse_type(hint)?)
    }

    /// [`attach_return_hint`](Self::attach_return_hint) with a type in declaration syntax
    pub fn attach_return_hint_str(&mut self, hint: &str) -> BindResult<()> {
        self.attach_return_hint(parse_type(hint)?)
    }

    fn redeclare(&mut self, signature: FunctionSignature) {
        // Safety: same code pointer; slots only change where a hint resolved them
        self.function = unsafe { ForeignFunction::new(self.function.code(), &signature) };
        debug!(function = %self.name, signature = %signature, "refined");
        self.signature = signature;
        self.state = ProxyState::Refined;
    }

    /// Whether `args` can be passed without further hints
    pub fn is_callable_with(&self, args: &[HostValue]) -> bool {
        self.check(args).is_ok()
    }

    /// Arity and hint checks performed before every decoded call
    pub fn check(&self, args: &[HostValue]) -> BindResult<()> {
        self.check_args(args)?;
        self.check_return()
    }

    fn check_args(&self, args: &[HostValue]) -> BindResult<()> {
        if args.len() != self.signature.arity() {
            return Err(BindError::ArityMismatch {
                symbol: self.name.clone(),
                expected: self.signature.arity(),
                got: args.len(),
            });
        }
        for (i, (sig, value)) in self.signature.params().iter().zip(args).enumerate() {
            let unresolved = match sig.shape() {
                Shape::Opaque(None) if !value.is_container() => None,
                _ => sig.first_unresolved(),
            };
            if let Some(position) = unresolved {
                return Err(self.arg_error(i, BindError::missing_hint(position)));
            }
        }
        Ok(())
    }

    fn check_return(&self) -> BindResult<()> {
        let ret = self.signature.ret();
        if matches!(ret.shape(), Shape::Opaque(None)) {
            return Ok(());
        }
        match ret.first_unresolved() {
            Some(position) => Err(BindError::missing_hint(position)
                .within("return")
                .for_symbol(&self.name)),
            None => Ok(()),
        }
    }

    fn arg_error(&self, position: usize, err: BindError) -> BindError {
        err.within(&format!("arg{}", position)).for_symbol(&self.name)
    }

    /// Call with host values and decode the return value
    ///
    /// Borrowed (`&`, `&mut`) wire arguments are freed after the call.
    pub fn call(&self, args: &[HostValue]) -> BindResult<HostValue> {
        self.check(args)?;
        let (raw, _prepared) = self.invoke(args)?;
        self.decode_ret(raw)
    }

    /// Call and read back every by-reference argument
    pub fn call_with_refs(&self, args: &[HostValue]) -> BindResult<CallOutput> {
        self.check(args)?;
        let (raw, prepared) = self.invoke(args)?;
        let ret = self.decode_ret(raw)?;
        let args = prepared
            .into_iter()
            .zip(self.signature.params())
            .enumerate()
            .map(|(i, (arg, sig))| arg.read_back(sig).map_err(|e| self.arg_error(i, e)))
            .collect::<BindResult<Vec<_>>>()?;
        Ok(CallOutput { ret, args })
    }

    /// Call without decoding anything
    ///
    /// The return is reported as the foreign function produced it; a wire
    /// return is an owned handle.
    pub fn call_raw(&self, args: &[HostValue]) -> BindResult<RawCall> {
        self.check_args(args)?;
        let (ret, prepared) = self.invoke(args)?;
        Ok(RawCall {
            ret,
            args: prepared.into_iter().map(Prepared::into_raw_arg).collect(),
        })
    }

    fn invoke(&self, args: &[HostValue]) -> BindResult<(RawReturn, Vec<Prepared>)> {
        let mut prepared = self
            .signature
            .params()
            .iter()
            .zip(args)
            .enumerate()
            .map(|(i, (sig, value))| prepare(sig, value).map_err(|e| self.arg_error(i, e)))
            .collect::<BindResult<Vec<_>>>()?;

        let storage: Vec<ArgStorage> = prepared.iter_mut().map(Prepared::storage).collect();
        debug!(function = %self.name, args = storage.len(), "call");
        // Safety: storage matches the declared slots and outlives the call
        let raw = unsafe { self.function.invoke(&storage) };
        Ok((raw, prepared))
    }

    fn decode_ret(&self, raw: RawReturn) -> BindResult<HostValue> {
        let ret = self.signature.ret();
        match (ret.shape(), raw) {
            (Shape::Opaque(None), RawReturn::Pointer(p)) => Ok(HostValue::Int(p as i64)),
            (_, raw) => {
                decode_return(raw, ret).map_err(|e| e.within("return").for_symbol(&self.name))
            }
        }
    }
}

fn prepare(sig: &TypeSignature, value: &HostValue) -> BindResult<Prepared> {
    if let Shape::Opaque(None) = sig.shape() {
        return match value {
            HostValue::Int(i) => Ok(Prepared::Direct(ArgStorage::Pointer(*i as usize as *mut c_void))),
            v if v.is_container() => Err(BindError::missing_hint("")),
            v => Err(BindError::mismatch("pointer-sized integer", v.type_name())),
        };
    }

    if sig.is_scalar() {
        let storage = scalar(sig, value)?;
        return Ok(match sig.access() {
            Access::Owned => Prepared::Direct(storage),
            _ => Prepared::Cell(ScalarCell::new(storage)),
        });
    }

    let handle = encode(value, sig)?;
    Ok(if sig.access().is_reference() {
        Prepared::Borrowed(handle)
    } else {
        Prepared::Owned(Some(handle))
    })
}

fn scalar(sig: &TypeSignature, value: &HostValue) -> BindResult<ArgStorage> {
    match (sig.shape(), value) {
        (Shape::Primitive(PrimitiveKind::Int(width)), HostValue::Int(i)) => {
            ArgStorage::int(*width, *i)
        }
        (Shape::Primitive(PrimitiveKind::Float32), HostValue::Float(f)) => {
            Ok(ArgStorage::Float32(*f as f32))
        }
        (Shape::Primitive(PrimitiveKind::Float32), HostValue::Int(i)) => {
            Ok(ArgStorage::Float32(*i as f32))
        }
        (Shape::Primitive(PrimitiveKind::Float64), HostValue::Float(f)) => {
            Ok(ArgStorage::Float64(*f))
        }
        (Shape::Primitive(PrimitiveKind::Float64), HostValue::Int(i)) => {
            Ok(ArgStorage::Float64(*i as f64))
        }
        _ => Err(BindError::mismatch(sig, value.type_name())),
    }
}

impl fmt::Debug for FunctionProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionProxy")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("signature", &self.signature.to_string())
            .field("state", &self.state)
            .field("library", &self.library.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::loader::SymbolTable;
    use crate::ffi::types::AbiType;
    use crate::signature::parse_declaration;
    use crate::wire::stats::snapshot;
    use crate::wire::{WireKind, WireValue};
    use pretty_assertions::assert_eq;

    extern "C" fn add_one(x: i64) -> i64 {
        x + 1
    }

    extern "C" fn minus_two(x: i32) -> i32 {
        x - 2
    }

    extern "C" fn set_negative(cell: *mut i32) {
        unsafe { *cell = -1 };
    }

    extern "C" fn halve_u8(cell: *mut u8) -> u8 {
        unsafe {
            *cell /= 2;
            *cell
        }
    }

    extern "C" fn double_in_place(x: *mut f64) {
        unsafe { *x *= 2.0 };
    }

    extern "C" fn list_len(list: *mut WireValue) -> i64 {
        let handle = unsafe { WireHandle::from_raw(list) }.unwrap();
        match handle.value() {
            WireValue::List(l) => l.len() as i64,
            _ => -1,
        }
    }

    extern "C" fn append_zero(list: *mut WireValue) {
        if let WireValue::List(l) = unsafe { &mut *list } {
            l.push(WireHandle::int(0));
        }
    }

    extern "C" fn echo_pointer(p: usize) -> usize {
        p
    }

    extern "C" fn null_string() -> *mut WireValue {
        ptr::null_mut()
    }

    fn library() -> Arc<dyn SymbolSource> {
        let table = unsafe {
            SymbolTable::new("proxy-tests")
                .with("add_one", add_one as *const c_void)
                .with("minus_two", minus_two as *const c_void)
                .with("set_negative", set_negative as *const c_void)
                .with("halve_u8", halve_u8 as *const c_void)
                .with("double_in_place", double_in_place as *const c_void)
                .with("list_len", list_len as *const c_void)
                .with("append_zero", append_zero as *const c_void)
                .with("echo_pointer", echo_pointer as *const c_void)
                .with("null_string", null_string as *const c_void)
        };
        Arc::new(table)
    }

    fn proxy(decl: &str) -> FunctionProxy {
        let decl = parse_declaration(decl).unwrap();
        FunctionProxy::bind(decl.symbol.clone(), decl, library()).unwrap()
    }

    #[test]
    fn test_call_by_value() {
        let f = proxy("add_one::type(i64);type(i64)");
        assert_eq!(f.call(&[HostValue::Int(1)]).unwrap(), HostValue::Int(2));
        assert_eq!(f.state(), ProxyState::Declared);
    }

    #[test]
    fn test_narrow_return_keeps_sign() {
        let f = proxy("minus_two::type(i32);type(i32)");
        assert_eq!(f.call(&[HostValue::Int(1)]).unwrap(), HostValue::Int(-1));
        assert_eq!(
            f.call(&[HostValue::Int(i64::from(i32::MIN) + 2)]).unwrap(),
            HostValue::Int(i64::from(i32::MIN))
        );
    }

    #[test]
    fn test_narrow_cell_read_back() {
        let f = proxy("set_negative::type(&mut i32);type()");
        let out = f.call_with_refs(&[HostValue::Int(7)]).unwrap();
        assert_eq!(out.args, vec![ArgOutput::ReadBack(HostValue::Int(-1))]);

        let f = proxy("halve_u8::type(&mut u8);type(u8)");
        let out = f.call_with_refs(&[HostValue::Int(200)]).unwrap();
        assert_eq!(out.ret, HostValue::Int(100));
        assert_eq!(out.args, vec![ArgOutput::ReadBack(HostValue::Int(100))]);
    }

    #[test]
    fn test_argument_outside_declared_width() {
        let f = proxy("minus_two::type(i32);type(i32)");
        match f.call(&[HostValue::Int(1 << 40)]) {
            Err(BindError::IntOutOfRange {
                width, position, ..
            }) => {
                assert_eq!(width, IntWidth::I32);
                assert_eq!(position, "arg0");
            }
            other => panic!("expected IntOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_call_raw_reports_cell_storage() {
        let f = proxy("set_negative::type(*mut i32);type()");
        let raw = f.call_raw(&[HostValue::Int(3)]).unwrap();
        assert!(matches!(raw.args[..], [RawArg::Cell(ArgStorage::Int32(-1))]));
    }

    #[test]
    fn test_proxy_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FunctionProxy>();

        let f = proxy("add_one::type(i64);type(i64)");
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let f = &f;
                    scope.spawn(move || f.call(&[HostValue::Int(t)]).unwrap())
                })
                .collect();
            for (t, handle) in handles.into_iter().enumerate() {
                assert_eq!(handle.join().unwrap(), HostValue::Int(t as i64 + 1));
            }
        });
    }

    #[test]
    fn test_arity_mismatch() {
        let f = proxy("add_one::type(i64);type(i64)");
        match f.call(&[]) {
            Err(BindError::ArityMismatch {
                symbol,
                expected,
                got,
            }) => {
                assert_eq!(symbol, "add_one");
                assert_eq!((expected, got), (1, 0));
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_cell_read_back() {
        let f = proxy("double_in_place::type(&mut f64);type()");
        let out = f.call_with_refs(&[HostValue::Float(1.25)]).unwrap();
        assert_eq!(out.ret, HostValue::None);
        assert_eq!(out.args, vec![ArgOutput::ReadBack(HostValue::Float(2.5))]);
    }

    #[test]
    fn test_opaque_list_needs_hint() {
        let f = proxy("list_len::type(WireList);type(i64)");
        let args = [HostValue::from(vec![1i64, 2, 3])];
        assert!(!f.is_callable_with(&args));
        match f.call(&args) {
            Err(BindError::MissingTypeHint { symbol, position }) => {
                assert_eq!(symbol, "list_len");
                assert_eq!(position, "arg0[*]");
            }
            other => panic!("expected MissingTypeHint, got {other:?}"),
        }
    }

    #[test]
    fn test_hint_moves_ownership() {
        let mut f = proxy("list_len::type(WireList);type(i64)");
        f.attach_arg_hint_str(0, "List<i64>").unwrap();
        assert_eq!(f.state(), ProxyState::Refined);

        let before = snapshot();
        let out = f.call_with_refs(&[HostValue::from(vec![1i64, 2, 3])]).unwrap();
        assert_eq!(out.ret, HostValue::Int(3));
        assert_eq!(out.args, vec![ArgOutput::Moved]);
        assert_eq!(snapshot().since(&before).live(), 0);
    }

    #[test]
    fn test_borrowed_wire_read_back_and_freed() {
        let mut f = proxy("append_zero::type(&mut WireList);type()");
        f.attach_arg_hint(0, TypeSignature::list(TypeSignature::int()))
            .unwrap();
        assert_eq!(f.signature().params()[0].access(), Access::MutBorrowed);

        let before = snapshot();
        let out = f.call_with_refs(&[HostValue::from(vec![7i64])]).unwrap();
        assert_eq!(
            out.args,
            vec![ArgOutput::ReadBack(HostValue::from(vec![7i64, 0]))]
        );
        f.call(&[HostValue::from(vec![7i64])]).unwrap();
        assert_eq!(snapshot().since(&before).live(), 0);
    }

    #[test]
    fn test_contradicting_hint_leaves_proxy_untouched() {
        let mut f = proxy("list_len::type(WireList);type(i64)");
        let err = f.attach_arg_hint_str(0, "Dict<i64, i64>").unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
        assert_eq!(f.state(), ProxyState::Declared);
        assert_eq!(
            f.signature().params()[0],
            TypeSignature::list(TypeSignature::opaque())
        );
    }

    #[test]
    fn test_hint_position_out_of_range() {
        let mut f = proxy("add_one::type(i64);type(i64)");
        assert!(matches!(
            f.attach_arg_hint(3, TypeSignature::int()),
            Err(BindError::TypeMismatch { .. })
        ));
        assert_eq!(f.state(), ProxyState::Declared);
    }

    #[test]
    fn test_hint_redeclares_pointer_slot() {
        let mut f = proxy("echo_pointer::type(usize);type(usize)");
        assert_eq!(f.signature().param_slots()[0].ty, AbiType::Pointer);
        f.attach_arg_hint_str(0, "Dict<u8, bool>").unwrap();
        assert_eq!(
            f.signature().param_slots()[0].ty,
            AbiType::Wire(WireKind::Dict)
        );
    }

    #[test]
    fn test_opaque_slot_takes_int_as_pointer() {
        let f = proxy("echo_pointer::type(usize);type(usize)");
        assert!(f.is_callable_with(&[HostValue::Int(4096)]));
        assert_eq!(f.call(&[HostValue::Int(4096)]).unwrap(), HostValue::Int(4096));

        let container = [HostValue::from(vec![1i64])];
        assert!(!f.is_callable_with(&container));
        assert!(matches!(
            f.call(&container),
            Err(BindError::MissingTypeHint { .. })
        ));
    }

    #[test]
    fn test_null_wire_return() {
        let f = proxy("null_string::type(String)");
        match f.call(&[]) {
            Err(BindError::NullPointer { symbol }) => assert_eq!(symbol, "null_string"),
            other => panic!("expected NullPointer, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_encoding_frees_earlier_arguments() {
        let decl = parse_declaration("list_len::type(List<String>);type(i64)").unwrap();
        let f = FunctionProxy::bind("len", decl, library()).unwrap();
        let before = snapshot();
        let err = f
            .call(&[HostValue::List(vec![HostValue::from("a"), HostValue::Int(1)])])
            .unwrap_err();
        assert_eq!(err.position(), Some("arg0[1]"));
        assert_eq!(snapshot().since(&before).live(), 0);
    }

    #[test]
    fn test_call_raw_keeps_handles() {
        let mut f = proxy("append_zero::type(&WireList);type()");
        f.attach_arg_hint_str(0, "List<i64>").unwrap();
        let raw = f.call_raw(&[HostValue::from(vec![1i64])]).unwrap();
        assert!(matches!(raw.ret, RawReturn::Void));
        match raw.args.into_iter().next() {
            Some(RawArg::Borrowed(handle)) => assert_eq!(handle.kind(), WireKind::List),
            other => panic!("expected a borrowed handle, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_symbol() {
        let decl = parse_declaration("absent::type(i64)").unwrap();
        assert!(matches!(
            FunctionProxy::bind("absent", decl, library()),
            Err(BindError::LoadError(_))
        ));
    }
}
