//! Wire dictionaries bound to a single key kind

use super::WireHandle;
use crate::error::{BindError, BindResult};
use crate::keys::{HashableKind, WireKey};
use std::collections::hash_map::{self, HashMap};

#[derive(Debug)]
pub struct WireDict {
    kind: HashableKind,
    entries: HashMap<WireKey, WireHandle>,
}

impl WireDict {
    pub fn new(kind: HashableKind) -> Self {
        Self::with_capacity(kind, 0)
    }

    pub fn with_capacity(kind: HashableKind, capacity: usize) -> Self {
        Self {
            kind,
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn kind(&self) -> HashableKind {
        self.kind
    }

    /// Insert a value; the key must be of the dictionary's kind
    ///
    /// A value already stored under the same key is freed.
    pub fn insert(&mut self, key: WireKey, value: WireHandle) -> BindResult<()> {
        if key.kind() != self.kind {
            return Err(BindError::mismatch(self.kind, key.kind()).within(".key"));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &WireKey) -> Option<&WireHandle> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the dictionary into an iterator bound to `kind`
    pub fn drain(self, kind: HashableKind) -> BindResult<DictDrain> {
        if kind != self.kind {
            return Err(BindError::mismatch(
                format!("Dict<{}, _>", kind),
                format!("Dict<{}, _>", self.kind),
            ));
        }
        Ok(DictDrain {
            kind,
            inner: self.entries.into_iter(),
        })
    }
}

/// Draining iterator over a consumed dictionary
///
/// Entries left unread are freed when the drain is dropped.
#[derive(Debug)]
pub struct DictDrain {
    kind: HashableKind,
    inner: hash_map::IntoIter<WireKey, WireHandle>,
}

impl DictDrain {
    pub fn kind(&self) -> HashableKind {
        self.kind
    }
}

impl Iterator for DictDrain {
    type Item = (WireKey, WireHandle);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DictDrain {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::stats::snapshot;

    #[test]
    fn test_insert_rejects_other_kind() {
        let mut dict = WireDict::new(HashableKind::U64);
        assert!(dict.insert(WireKey::U64(0), WireHandle::int(1)).is_ok());
        let err = dict
            .insert(WireKey::I64(1), WireHandle::int(2))
            .unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_drain_kind_must_match() {
        let before = snapshot();
        let mut dict = WireDict::new(HashableKind::String);
        dict.insert(WireKey::String("a".into()), WireHandle::boolean(true))
            .unwrap();
        assert!(dict.drain(HashableKind::I64).is_err());
        assert_eq!(snapshot().since(&before).live(), 0);
    }

    #[test]
    fn test_drain_yields_each_entry() {
        let mut dict = WireDict::new(HashableKind::I32);
        for i in 0..4 {
            dict.insert(WireKey::I32(i), WireHandle::int(i as i64)).unwrap();
        }
        let drain = dict.drain(HashableKind::I32).unwrap();
        assert_eq!(drain.kind(), HashableKind::I32);
        assert_eq!(drain.len(), 4);
        let mut keys: Vec<_> = drain.map(|(k, _)| k).collect();
        keys.sort_by_key(|k| match k {
            WireKey::I32(i) => *i,
            _ => -1,
        });
        assert_eq!(keys[0], WireKey::I32(0));
        assert_eq!(keys[3], WireKey::I32(3));
    }

    #[test]
    fn test_replaced_value_is_freed() {
        let before = snapshot();
        {
            let mut dict = WireDict::new(HashableKind::Bool);
            dict.insert(WireKey::Bool(true), WireHandle::int(1)).unwrap();
            dict.insert(WireKey::Bool(true), WireHandle::int(2)).unwrap();
            assert_eq!(dict.len(), 1);
            assert_eq!(snapshot().since(&before).live(), 1);
        }
        assert_eq!(snapshot().since(&before).live(), 0);
    }
}
