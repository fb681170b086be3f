//! ABI declaration of foreign function slots
//!
//! Type mapping:
//! - owned `Int` → integer of the declared width by value
//! - owned `Float32`/`Float64` → `Float32`/`Float64` by value
//! - `Bool`, `String` and containers → `Wire(kind)` pointer
//! - unresolved pointer-sized values → `Pointer`
//! - any scalar behind `&`, `&mut`, `*const` or `*mut` → pointer to a cell

use crate::signature::{Access, Container, IntWidth, PrimitiveKind, Shape, TypeSignature};
use crate::wire::WireKind;
use libffi::middle::Type;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Void,
    Int(IntWidth),
    Float32,
    Float64,
    Wire(WireKind),
    Pointer,
}

/// One declared parameter or return slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiSlot {
    pub ty: AbiType,
    /// Passed through a pointer rather than by value
    pub indirect: bool,
}

impl AbiSlot {
    /// Slot a signature declares
    pub fn for_signature(sig: &TypeSignature) -> Self {
        let ty = match sig.shape() {
            Shape::Primitive(PrimitiveKind::Int(width)) => AbiType::Int(*width),
            Shape::Primitive(PrimitiveKind::Float32) => AbiType::Float32,
            Shape::Primitive(PrimitiveKind::Float64) => AbiType::Float64,
            Shape::Primitive(PrimitiveKind::Bool) => AbiType::Wire(WireKind::Bool),
            Shape::Primitive(PrimitiveKind::String) => AbiType::Wire(WireKind::String),
            Shape::Tuple(_) | Shape::Opaque(Some(Container::Tuple)) => AbiType::Wire(WireKind::Tuple),
            Shape::List(_) | Shape::Opaque(Some(Container::List)) => AbiType::Wire(WireKind::List),
            Shape::Dict(..) | Shape::Opaque(Some(Container::Dict)) => AbiType::Wire(WireKind::Dict),
            Shape::Opaque(None) => AbiType::Pointer,
            Shape::Void => AbiType::Void,
        };
        Self {
            ty,
            indirect: sig.access() != Access::Owned,
        }
    }

    /// Scalars passed by value in registers
    pub fn is_by_value(&self) -> bool {
        !self.indirect && matches!(self.ty, AbiType::Int(_) | AbiType::Float32 | AbiType::Float64)
    }

    /// libffi type of the slot
    pub fn ffi_type(&self) -> Type {
        match self.ty {
            AbiType::Void => Type::void(),
            _ if self.indirect => Type::pointer(),
            AbiType::Int(width) => int_type(width),
            AbiType::Float32 => Type::f32(),
            AbiType::Float64 => Type::f64(),
            AbiType::Wire(_) | AbiType::Pointer => Type::pointer(),
        }
    }
}

fn int_type(width: IntWidth) -> Type {
    match width {
        IntWidth::I8 => Type::i8(),
        IntWidth::I16 => Type::i16(),
        IntWidth::I32 => Type::i32(),
        IntWidth::I64 => Type::i64(),
        IntWidth::U8 => Type::u8(),
        IntWidth::U16 => Type::u16(),
        IntWidth::U32 => Type::u32(),
        IntWidth::U64 => Type::u64(),
    }
}

impl fmt::Display for AbiSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indirect {
            f.write_str("*")?;
        }
        match self.ty {
            AbiType::Void => f.write_str("void"),
            AbiType::Int(width) => write!(f, "{}", width),
            AbiType::Float32 => f.write_str("f32"),
            AbiType::Float64 => f.write_str("f64"),
            AbiType::Wire(kind) => write!(f, "*{}", kind),
            AbiType::Pointer => f.write_str("*void"),
        }
    }
}

/// Parameter and return types with the ABI slots declared for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    params: Vec<TypeSignature>,
    ret: TypeSignature,
    param_slots: Vec<AbiSlot>,
    ret_slot: AbiSlot,
}

impl FunctionSignature {
    pub fn new(params: Vec<TypeSignature>, ret: TypeSignature) -> Self {
        let param_slots = params.iter().map(AbiSlot::for_signature).collect();
        let ret_slot = AbiSlot::for_signature(&ret);
        Self {
            params,
            ret,
            param_slots,
            ret_slot,
        }
    }

    pub fn params(&self) -> &[TypeSignature] {
        &self.params
    }

    pub fn ret(&self) -> &TypeSignature {
        &self.ret
    }

    pub fn param_slots(&self) -> &[AbiSlot] {
        &self.param_slots
    }

    pub fn ret_slot(&self) -> AbiSlot {
        self.ret_slot
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Copy with parameter `position` replaced and its slot re-declared
    pub fn with_param(&self, position: usize, sig: TypeSignature) -> Self {
        let mut next = self.clone();
        next.param_slots[position] = AbiSlot::for_signature(&sig);
        next.params[position] = sig;
        next
    }

    /// Copy with the return type replaced and its slot re-declared
    pub fn with_ret(&self, sig: TypeSignature) -> Self {
        let mut next = self.clone();
        next.ret_slot = AbiSlot::for_signature(&sig);
        next.ret = sig;
        next
    }

    /// True when every parameter and the return are free of opaque slots
    pub fn is_resolved(&self) -> bool {
        self.params.iter().all(TypeSignature::is_resolved) && self.ret.is_resolved()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::parse_type;
    use rstest::rstest;

    fn slot(src: &str) -> AbiSlot {
        AbiSlot::for_signature(&parse_type(src).unwrap())
    }

    #[rstest]
    #[case("i64", AbiType::Int(IntWidth::I64), false)]
    #[case("i32", AbiType::Int(IntWidth::I32), false)]
    #[case("u8", AbiType::Int(IntWidth::U8), false)]
    #[case("f32", AbiType::Float32, false)]
    #[case("&mut i64", AbiType::Int(IntWidth::I64), true)]
    #[case("&mut c_int", AbiType::Int(IntWidth::I32), true)]
    #[case("bool", AbiType::Wire(WireKind::Bool), false)]
    #[case("&str", AbiType::Wire(WireKind::String), true)]
    #[case("WireList", AbiType::Wire(WireKind::List), false)]
    #[case("WireDict", AbiType::Wire(WireKind::Dict), false)]
    #[case("*mut Tuple(i64)", AbiType::Wire(WireKind::Tuple), true)]
    #[case("usize", AbiType::Pointer, false)]
    #[case("()", AbiType::Void, false)]
    fn test_slot_mapping(#[case] src: &str, #[case] ty: AbiType, #[case] indirect: bool) {
        assert_eq!(slot(src), AbiSlot { ty, indirect });
    }

    #[test]
    fn test_by_value_only_for_owned_scalars() {
        assert!(slot("i64").is_by_value());
        assert!(slot("f64").is_by_value());
        assert!(!slot("&i64").is_by_value());
        assert!(!slot("String").is_by_value());
    }

    #[test]
    fn test_with_param_redeclares_slot() {
        let sig = FunctionSignature::new(vec![parse_type("usize").unwrap()], TypeSignature::void());
        assert!(!sig.is_resolved());
        let refined = sig.with_param(0, parse_type("Dict<i64, i64>").unwrap());
        assert_eq!(refined.param_slots()[0].ty, AbiType::Wire(WireKind::Dict));
        assert!(refined.is_resolved());
        assert_eq!(sig.param_slots()[0].ty, AbiType::Pointer);
        assert_eq!(refined.to_string(), "(Dict<i64, i64>) -> ()");
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(slot("&mut i64").to_string(), "*i64");
        assert_eq!(slot("u16").to_string(), "u16");
        assert_eq!(slot("WireList").to_string(), "*WireList");
    }
}
