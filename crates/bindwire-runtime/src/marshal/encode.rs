//! Host value → wire value

use crate::error::{BindError, BindResult};
use crate::keys::KeyCodec;
use crate::signature::{PrimitiveKind, Shape, TypeSignature};
use crate::value::HostValue;
use crate::wire::{WireDict, WireHandle, WireList, WireTuple};
use tracing::trace;

/// Encode `value` as a wire value of shape `sig`
///
/// Unresolved signature slots are reported before anything is allocated.
pub fn encode(value: &HostValue, sig: &TypeSignature) -> BindResult<WireHandle> {
    if let Some(position) = sig.first_unresolved() {
        return Err(BindError::missing_hint(position));
    }
    trace!(signature = %sig, value = value.type_name(), "encode");
    encode_value(value, sig)
}

fn encode_value(value: &HostValue, sig: &TypeSignature) -> BindResult<WireHandle> {
    match (sig.shape(), value) {
        (Shape::Primitive(kind), _) => encode_primitive(*kind, value, sig),

        (Shape::Tuple(elems), HostValue::Tuple(items)) => {
            if elems.len() != items.len() {
                return Err(BindError::mismatch(
                    sig,
                    format!("tuple of {}", items.len()),
                ));
            }
            let mut tuple = WireTuple::new();
            for idx in (0..items.len()).rev() {
                let elem = encode_value(&items[idx], &elems[idx]).map_err(|e| e.at_index(idx))?;
                tuple.push_front(idx, elem);
            }
            Ok(WireHandle::tuple(tuple))
        }

        (Shape::List(elem_sig), HostValue::List(items)) => {
            let mut list = WireList::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                list.push(encode_value(item, elem_sig).map_err(|e| e.at_index(idx))?);
            }
            Ok(WireHandle::list(list))
        }

        (Shape::Dict(kind, value_sig), HostValue::Dict(entries)) => {
            let codec = KeyCodec::for_kind(*kind);
            let mut dict = WireDict::with_capacity(*kind, entries.len());
            for (key, item) in entries {
                let wire_key = codec.encode(key).map_err(|e| e.within(".key"))?;
                let wire_value = encode_value(item, value_sig).map_err(|e| e.within(".value"))?;
                dict.insert(wire_key, wire_value)?;
            }
            Ok(WireHandle::dict(dict))
        }

        (Shape::Void, _) => Err(BindError::unsupported("()")),
        (Shape::Opaque(_), _) => Err(BindError::missing_hint("")),
        _ => Err(BindError::mismatch(sig, value.type_name())),
    }
}

fn encode_primitive(
    kind: PrimitiveKind,
    value: &HostValue,
    sig: &TypeSignature,
) -> BindResult<WireHandle> {
    match (kind, value) {
        (PrimitiveKind::Int(width), HostValue::Int(i)) => Ok(WireHandle::int(width.check(*i)?)),
        (PrimitiveKind::Float32, HostValue::Float(f)) => Ok(WireHandle::float32(*f as f32)),
        (PrimitiveKind::Float32, HostValue::Int(i)) => Ok(WireHandle::float32(*i as f32)),
        (PrimitiveKind::Float64, HostValue::Float(f)) => Ok(WireHandle::float64(*f)),
        (PrimitiveKind::Float64, HostValue::Int(i)) => Ok(WireHandle::float64(*i as f64)),
        (PrimitiveKind::Bool, HostValue::Bool(b)) => Ok(WireHandle::boolean(*b)),
        (PrimitiveKind::String, HostValue::Str(s)) => WireHandle::string(s),
        _ => Err(BindError::mismatch(sig, value.type_name())),
    }
}
