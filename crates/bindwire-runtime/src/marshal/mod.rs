//! Value marshaling - host ↔ wire conversions
//!
//! - `encode()`: build a wire value from a host value and a resolved signature
//! - `decode()`: consume a wire value and rebuild the host value
//! - `decode_return()`: turn a raw foreign return into a host value
//!
//! # Memory Safety
//!
//! - Partially built wire values are freed by drop when encoding fails
//! - Decoding always consumes its handle, nested containers included
//! - Errors carry the position path of the failing element

pub mod decode;
pub mod encode;

pub use decode::{decode, decode_return, RawReturn};
pub use encode::encode;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::HashableKind;
    use crate::signature::{parse_type, Access, IntWidth, TypeSignature};
    use crate::value::{HostKey, HostValue};
    use crate::wire::stats::snapshot;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::collections::BTreeMap;
    use std::ops::RangeInclusive;

    fn round_trip(value: &HostValue, sig: &TypeSignature) -> HostValue {
        let handle = encode(value, sig).unwrap();
        decode(handle, sig).unwrap()
    }

    #[rstest]
    #[case(HostValue::Int(-42), "i64")]
    #[case(HostValue::Int(i64::MAX), "u64")]
    #[case(HostValue::Float(0.25), "f32")]
    #[case(HostValue::Float(-1.0e300), "f64")]
    #[case(HostValue::Bool(true), "bool")]
    #[case(HostValue::from("unicode ✓"), "String")]
    #[case(HostValue::from(""), "WireString")]
    fn test_primitive_round_trip(#[case] value: HostValue, #[case] sig: &str) {
        let sig = parse_type(sig).unwrap();
        assert_eq!(round_trip(&value, &sig), value);
    }

    #[test]
    fn test_nested_round_trip_depth_three() {
        let sig = parse_type("Dict<String, List<Tuple(i64, List<bool>, f64)>>").unwrap();
        let row = |n: i64| {
            HostValue::Tuple(vec![
                HostValue::Int(n),
                HostValue::from(vec![true, false]),
                HostValue::Float(n as f64 / 2.0),
            ])
        };
        let value = HostValue::dict([
            ("a", HostValue::List(vec![row(1), row(2)])),
            ("b", HostValue::List(vec![])),
        ]);

        let before = snapshot();
        assert_eq!(round_trip(&value, &sig), value);
        let delta = snapshot().since(&before);
        assert!(delta.allocated > 0);
        assert_eq!(delta.live(), 0);
    }

    fn int_leaf(
        width: IntWidth,
        range: RangeInclusive<i64>,
    ) -> BoxedStrategy<(HostValue, TypeSignature)> {
        range
            .prop_map(move |i| (HostValue::Int(i), TypeSignature::int_of(width)))
            .boxed()
    }

    fn leaf_strategy() -> impl Strategy<Value = (HostValue, TypeSignature)> {
        prop_oneof![
            any::<i64>().prop_map(|i| (HostValue::Int(i), TypeSignature::int())),
            int_leaf(IntWidth::I8, i64::from(i8::MIN)..=i64::from(i8::MAX)),
            int_leaf(IntWidth::I32, i64::from(i32::MIN)..=i64::from(i32::MAX)),
            int_leaf(IntWidth::U16, 0..=i64::from(u16::MAX)),
            int_leaf(IntWidth::U64, 0..=i64::MAX),
            any::<bool>().prop_map(|b| (HostValue::Bool(b), TypeSignature::boolean())),
            // f32 values survive the f64 -> f32 -> f64 trip exactly
            (-1.0e6f32..1.0e6)
                .prop_map(|f| (HostValue::Float(f64::from(f)), TypeSignature::float32())),
            (-1.0e9f64..1.0e9).prop_map(|f| (HostValue::Float(f), TypeSignature::float64())),
            "[a-zA-Z0-9 ]{0,12}".prop_map(|s| (HostValue::Str(s), TypeSignature::string())),
        ]
    }

    fn int_keys(
        kind: HashableKind,
        range: RangeInclusive<i64>,
    ) -> BoxedStrategy<(HashableKind, Vec<HostKey>)> {
        prop::collection::btree_set(range, 0..4)
            .prop_map(move |keys| (kind, keys.into_iter().map(HostKey::Int).collect()))
            .boxed()
    }

    fn key_strategy() -> impl Strategy<Value = (HashableKind, Vec<HostKey>)> {
        prop_oneof![
            int_keys(HashableKind::I64, i64::MIN..=i64::MAX),
            int_keys(HashableKind::I8, i64::from(i8::MIN)..=i64::from(i8::MAX)),
            int_keys(HashableKind::U16, 0..=i64::from(u16::MAX)),
            int_keys(HashableKind::U64, 0..=i64::MAX),
            prop::collection::btree_set(any::<bool>(), 0..3).prop_map(|keys| {
                (HashableKind::Bool, keys.into_iter().map(HostKey::Bool).collect())
            }),
            prop::collection::btree_set("[a-z]{0,6}", 0..4).prop_map(|keys| {
                (HashableKind::String, keys.into_iter().map(HostKey::Str).collect())
            }),
        ]
    }

    fn nested_strategy() -> impl Strategy<Value = (HostValue, TypeSignature)> {
        leaf_strategy().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                // Lists repeat one element signature
                (inner.clone(), 0usize..4).prop_map(|((value, sig), n)| {
                    (HostValue::List(vec![value; n]), TypeSignature::list(sig))
                }),
                prop::collection::vec(inner.clone(), 1..4).prop_map(|elems| {
                    let (values, sigs): (Vec<_>, Vec<_>) = elems.into_iter().unzip();
                    (HostValue::Tuple(values), TypeSignature::tuple(sigs))
                }),
                (inner, key_strategy()).prop_map(|((value, sig), (kind, keys))| {
                    let map: BTreeMap<HostKey, HostValue> =
                        keys.into_iter().map(|k| (k, value.clone())).collect();
                    (HostValue::Dict(map), TypeSignature::dict_of(kind, sig))
                }),
            ]
        })
    }

    /// Top-level values are sometimes declared borrowed, as `&T` parameters are
    fn declared_strategy() -> impl Strategy<Value = (HostValue, TypeSignature)> {
        (nested_strategy(), any::<bool>()).prop_map(|((value, sig), borrowed)| {
            if borrowed {
                (value, sig.with_access(Access::Borrowed))
            } else {
                (value, sig)
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10_000))]

        #[test]
        fn prop_round_trip_frees_exactly_once((value, sig) in declared_strategy()) {
            let before = snapshot();
            let handle = encode(&value, &sig).unwrap();
            let decoded = decode(handle, &sig).unwrap();
            let delta = snapshot().since(&before);
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(delta.allocated, delta.freed);
        }
    }
}
