//! Hashable-key subsystem
//!
//! A wire dictionary is bound to exactly one key kind at construction. The
//! codec for that kind converts host keys to wire keys (with range checks for
//! narrow integers) and back.

use crate::error::{BindError, BindResult};
use crate::value::HostKey;
use std::fmt;

/// Key kinds a wire dictionary can be built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashableKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    String,
}

/// Host key type a kind decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyType {
    Int,
    Bool,
    Str,
}

impl HashableKind {
    pub const ALL: [HashableKind; 10] = [
        HashableKind::U8,
        HashableKind::I8,
        HashableKind::I16,
        HashableKind::U16,
        HashableKind::I32,
        HashableKind::U32,
        HashableKind::I64,
        HashableKind::U64,
        HashableKind::Bool,
        HashableKind::String,
    ];

    /// Resolve a key type name as written in a declaration
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i8" => HashableKind::I8,
            "i16" => HashableKind::I16,
            "i32" => HashableKind::I32,
            "i64" => HashableKind::I64,
            "u8" => HashableKind::U8,
            "u16" => HashableKind::U16,
            "u32" => HashableKind::U32,
            "u64" => HashableKind::U64,
            "bool" => HashableKind::Bool,
            "String" | "str" | "string" | "WireString" => HashableKind::String,
            _ => return None,
        })
    }

    /// Key code used on the C ABI
    pub fn code(self) -> u8 {
        match self {
            HashableKind::U8 => 1,
            HashableKind::I8 => 2,
            HashableKind::I16 => 3,
            HashableKind::U16 => 4,
            HashableKind::I32 => 5,
            HashableKind::U32 => 6,
            HashableKind::I64 => 7,
            HashableKind::U64 => 8,
            HashableKind::Bool => 11,
            HashableKind::String => 12,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            HashableKind::I8 => "i8",
            HashableKind::I16 => "i16",
            HashableKind::I32 => "i32",
            HashableKind::I64 => "i64",
            HashableKind::U8 => "u8",
            HashableKind::U16 => "u16",
            HashableKind::U32 => "u32",
            HashableKind::U64 => "u64",
            HashableKind::Bool => "bool",
            HashableKind::String => "String",
        }
    }

    pub fn host_key_type(self) -> HostKeyType {
        match self {
            HashableKind::Bool => HostKeyType::Bool,
            HashableKind::String => HostKeyType::Str,
            _ => HostKeyType::Int,
        }
    }
}

impl fmt::Display for HashableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key stored inside a wire dictionary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WireKey {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bool(bool),
    String(String),
}

impl WireKey {
    pub fn kind(&self) -> HashableKind {
        match self {
            WireKey::I8(_) => HashableKind::I8,
            WireKey::I16(_) => HashableKind::I16,
            WireKey::I32(_) => HashableKind::I32,
            WireKey::I64(_) => HashableKind::I64,
            WireKey::U8(_) => HashableKind::U8,
            WireKey::U16(_) => HashableKind::U16,
            WireKey::U32(_) => HashableKind::U32,
            WireKey::U64(_) => HashableKind::U64,
            WireKey::Bool(_) => HashableKind::Bool,
            WireKey::String(_) => HashableKind::String,
        }
    }
}

/// Converts keys of one kind between host and wire representations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodec {
    kind: HashableKind,
}

/// Resolve a key type name to its codec
///
/// Only integer, bool and string keys are hashable; anything else is rejected
/// when the dictionary signature is built.
pub fn resolve(name: &str) -> BindResult<KeyCodec> {
    HashableKind::from_name(name)
        .map(KeyCodec::for_kind)
        .ok_or_else(|| BindError::unsupported(name))
}

macro_rules! narrow_int {
    ($kind:expr, $variant:ident, $ty:ty, $value:expr) => {
        <$ty>::try_from($value)
            .map(WireKey::$variant)
            .map_err(|_| BindError::KeyOutOfRange {
                kind: $kind,
                value: $value.to_string(),
            })
    };
}

impl KeyCodec {
    pub fn for_kind(kind: HashableKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> HashableKind {
        self.kind
    }

    /// Key code handed to `bindwire_dict_new`
    pub fn wire_descriptor(&self) -> u8 {
        self.kind.code()
    }

    pub fn host_key_type(&self) -> HostKeyType {
        self.kind.host_key_type()
    }

    /// Host key to wire key
    pub fn encode(&self, key: &HostKey) -> BindResult<WireKey> {
        let kind = self.kind;
        match (kind, key) {
            (HashableKind::I8, HostKey::Int(i)) => narrow_int!(kind, I8, i8, *i),
            (HashableKind::I16, HostKey::Int(i)) => narrow_int!(kind, I16, i16, *i),
            (HashableKind::I32, HostKey::Int(i)) => narrow_int!(kind, I32, i32, *i),
            (HashableKind::I64, HostKey::Int(i)) => Ok(WireKey::I64(*i)),
            (HashableKind::U8, HostKey::Int(i)) => narrow_int!(kind, U8, u8, *i),
            (HashableKind::U16, HostKey::Int(i)) => narrow_int!(kind, U16, u16, *i),
            (HashableKind::U32, HostKey::Int(i)) => narrow_int!(kind, U32, u32, *i),
            (HashableKind::U64, HostKey::Int(i)) => narrow_int!(kind, U64, u64, *i),
            (HashableKind::Bool, HostKey::Bool(b)) => Ok(WireKey::Bool(*b)),
            (HashableKind::String, HostKey::Str(s)) if s.contains('\0') => Err(
                BindError::InvalidString(format!("nul byte in dictionary key {:?}", s)),
            ),
            (HashableKind::String, HostKey::Str(s)) => Ok(WireKey::String(s.clone())),
            (_, other) => Err(BindError::mismatch(kind, other.type_name())),
        }
    }

    /// Wire key to host key
    pub fn decode(&self, key: WireKey) -> BindResult<HostKey> {
        if key.kind() != self.kind {
            return Err(BindError::mismatch(self.kind, key.kind()));
        }
        Ok(match key {
            WireKey::I8(v) => HostKey::Int(v.into()),
            WireKey::I16(v) => HostKey::Int(v.into()),
            WireKey::I32(v) => HostKey::Int(v.into()),
            WireKey::I64(v) => HostKey::Int(v),
            WireKey::U8(v) => HostKey::Int(v.into()),
            WireKey::U16(v) => HostKey::Int(v.into()),
            WireKey::U32(v) => HostKey::Int(v.into()),
            WireKey::U64(v) => {
                HostKey::Int(i64::try_from(v).map_err(|_| BindError::KeyOutOfRange {
                    kind: HashableKind::U64,
                    value: v.to_string(),
                })?)
            }
            WireKey::Bool(b) => HostKey::Bool(b),
            WireKey::String(s) => HostKey::Str(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("i8", HashableKind::I8)]
    #[case("u64", HashableKind::U64)]
    #[case("bool", HashableKind::Bool)]
    #[case("str", HashableKind::String)]
    #[case("WireString", HashableKind::String)]
    fn test_resolve_names(#[case] name: &str, #[case] kind: HashableKind) {
        assert_eq!(resolve(name).unwrap().kind(), kind);
    }

    #[rstest]
    #[case("f64")]
    #[case("f32")]
    #[case("List")]
    #[case("WireTuple")]
    fn test_resolve_rejects_unhashable(#[case] name: &str) {
        assert!(matches!(
            resolve(name),
            Err(BindError::UnsupportedType { token }) if token == name
        ));
    }

    #[test]
    fn test_codes_round_trip() {
        for kind in HashableKind::ALL {
            assert_eq!(HashableKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(HashableKind::from_code(9), None);
        assert_eq!(resolve("u8").unwrap().wire_descriptor(), 1);
        assert_eq!(resolve("String").unwrap().wire_descriptor(), 12);
    }

    #[rstest]
    #[case(HashableKind::U8, 256)]
    #[case(HashableKind::U8, -1)]
    #[case(HashableKind::I8, 128)]
    #[case(HashableKind::I16, -40_000)]
    #[case(HashableKind::U32, -5)]
    #[case(HashableKind::U64, -1)]
    fn test_narrow_keys_out_of_range(#[case] kind: HashableKind, #[case] value: i64) {
        let codec = KeyCodec::for_kind(kind);
        assert!(matches!(
            codec.encode(&HostKey::Int(value)),
            Err(BindError::KeyOutOfRange { kind: k, .. }) if k == kind
        ));
    }

    #[test]
    fn test_u64_above_host_range_rejected_on_decode() {
        let codec = KeyCodec::for_kind(HashableKind::U64);
        assert!(matches!(
            codec.decode(WireKey::U64(u64::MAX)),
            Err(BindError::KeyOutOfRange { .. })
        ));
        assert_eq!(
            codec.decode(WireKey::U64(7)).unwrap(),
            HostKey::Int(7)
        );
    }

    #[test]
    fn test_host_type_mismatch() {
        let codec = KeyCodec::for_kind(HashableKind::String);
        assert!(matches!(
            codec.encode(&HostKey::Int(1)),
            Err(BindError::TypeMismatch { .. })
        ));
        assert_eq!(codec.host_key_type(), HostKeyType::Str);
    }

    #[test]
    fn test_decode_rejects_foreign_kind() {
        let codec = KeyCodec::for_kind(HashableKind::I64);
        assert!(codec.decode(WireKey::I32(1)).is_err());
        assert_eq!(codec.decode(WireKey::I64(-3)).unwrap(), HostKey::Int(-3));
    }
}
