//! Wire value → host value
//!
//! Decoding consumes the handle. Containers are drained element by element;
//! whatever is left when an error stops the walk is freed by drop.

use crate::error::{BindError, BindResult};
use crate::keys::KeyCodec;
use crate::signature::{PrimitiveKind, Shape, TypeSignature};
use crate::value::HostValue;
use crate::wire::{WireHandle, WireValue};
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

/// Return value of a foreign call before decoding
#[derive(Debug)]
pub enum RawReturn {
    Void,
    Int(i64),
    Float32(f32),
    Float64(f64),
    /// Pointer-sized integer
    Pointer(usize),
    /// Adopted wire value; `None` when the function returned null
    Wire(Option<WireHandle>),
}

/// Decode and free a wire value
pub fn decode(handle: WireHandle, sig: &TypeSignature) -> BindResult<HostValue> {
    if let Some(position) = sig.first_unresolved() {
        return Err(BindError::missing_hint(position));
    }
    trace!(signature = %sig, kind = %handle.kind(), "decode");
    decode_value(handle, sig)
}

fn decode_value(handle: WireHandle, sig: &TypeSignature) -> BindResult<HostValue> {
    match sig.shape() {
        Shape::Primitive(kind) => decode_primitive(*kind, handle.into_value(), sig),

        Shape::Tuple(elems) => match handle.into_value() {
            WireValue::Tuple(tuple) => {
                if tuple.len() != elems.len() {
                    return Err(BindError::mismatch(
                        sig,
                        format!("tuple of {}", tuple.len()),
                    ));
                }
                let mut out = Vec::with_capacity(elems.len());
                for (pos, (idx, elem)) in tuple.drain().enumerate() {
                    if idx != pos {
                        return Err(BindError::mismatch(
                            format!("element {}", pos),
                            format!("element {}", idx),
                        )
                        .at_index(pos));
                    }
                    out.push(decode_value(elem, &elems[pos]).map_err(|e| e.at_index(pos))?);
                }
                Ok(HostValue::Tuple(out))
            }
            other => Err(BindError::mismatch(sig, other.kind())),
        },

        Shape::List(elem_sig) => match handle.into_value() {
            WireValue::List(mut list) => {
                let mut idx = list.len();
                let mut out = VecDeque::with_capacity(idx);
                while let Some(elem) = list.pop() {
                    idx -= 1;
                    out.push_front(decode_value(elem, elem_sig).map_err(|e| e.at_index(idx))?);
                }
                Ok(HostValue::List(out.into()))
            }
            other => Err(BindError::mismatch(sig, other.kind())),
        },

        Shape::Dict(kind, value_sig) => match handle.into_value() {
            WireValue::Dict(dict) => {
                let codec = KeyCodec::for_kind(*kind);
                let mut out = BTreeMap::new();
                for (key, value) in dict.drain(*kind)? {
                    let key = codec.decode(key).map_err(|e| e.within(".key"))?;
                    let value = decode_value(value, value_sig).map_err(|e| e.within(".value"))?;
                    out.insert(key, value);
                }
                Ok(HostValue::Dict(out))
            }
            other => Err(BindError::mismatch(sig, other.kind())),
        },

        Shape::Opaque(_) => Err(BindError::missing_hint("")),
        Shape::Void => Err(BindError::unsupported("()")),
    }
}

fn decode_primitive(
    kind: PrimitiveKind,
    value: WireValue,
    sig: &TypeSignature,
) -> BindResult<HostValue> {
    match (kind, value) {
        (PrimitiveKind::Int(width), WireValue::Int64(i)) => Ok(HostValue::Int(width.check(i)?)),
        (PrimitiveKind::Float32, WireValue::Float32(f)) => Ok(HostValue::Float(f64::from(f))),
        (PrimitiveKind::Float64, WireValue::Float64(f)) => Ok(HostValue::Float(f)),
        (PrimitiveKind::Bool, WireValue::Bool(b)) => Ok(HostValue::Bool(b)),
        (PrimitiveKind::String, WireValue::String(s)) => s
            .into_string()
            .map(HostValue::Str)
            .map_err(|e| BindError::InvalidString(e.to_string())),
        (_, other) => Err(BindError::mismatch(sig, other.kind())),
    }
}

/// Decode the raw return of a foreign call
///
/// `Void` yields `None` without touching the wire model; by-value scalars
/// convert directly; wire pointers go through [`decode`].
pub fn decode_return(raw: RawReturn, sig: &TypeSignature) -> BindResult<HostValue> {
    match (sig.shape(), raw) {
        (Shape::Void, RawReturn::Void) => Ok(HostValue::None),
        (Shape::Primitive(PrimitiveKind::Int(width)), RawReturn::Int(i)) => {
            Ok(HostValue::Int(width.from_abi(i)?))
        }
        (Shape::Primitive(PrimitiveKind::Float32), RawReturn::Float32(f)) => {
            Ok(HostValue::Float(f64::from(f)))
        }
        (Shape::Primitive(PrimitiveKind::Float64), RawReturn::Float64(f)) => {
            Ok(HostValue::Float(f))
        }
        (_, RawReturn::Wire(None)) => Err(BindError::NullPointer {
            symbol: String::new(),
        }),
        (_, RawReturn::Wire(Some(handle))) => decode(handle, sig),
        (_, raw) => Err(BindError::mismatch(sig, raw_name(&raw))),
    }
}

fn raw_name(raw: &RawReturn) -> &'static str {
    match raw {
        RawReturn::Void => "()",
        RawReturn::Int(_) => "i64",
        RawReturn::Float32(_) => "f32",
        RawReturn::Float64(_) => "f64",
        RawReturn::Pointer(_) => "pointer",
        RawReturn::Wire(_) => "wire value",
    }
}
