//! Wire tuples: a chain of indexed nodes built back to front

use super::WireHandle;

#[derive(Debug)]
struct TupleNode {
    idx: usize,
    elem: WireHandle,
    next: Option<Box<TupleNode>>,
}

/// Singly-linked tuple
///
/// Encoders build it in reverse index order with `push_front`, so the head is
/// element 0 once construction finishes.
#[derive(Debug, Default)]
pub struct WireTuple {
    head: Option<Box<TupleNode>>,
    len: usize,
}

impl WireTuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `elem` at position `idx` in front of the chain built so far
    pub fn push_front(&mut self, idx: usize, elem: WireHandle) {
        let next = self.head.take();
        self.head = Some(Box::new(TupleNode { idx, elem, next }));
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element at position `idx`
    pub fn get(&self, idx: usize) -> Option<&WireHandle> {
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            if n.idx == idx {
                return Some(&n.elem);
            }
            node = n.next.as_deref();
        }
        None
    }

    /// Unlink and return the element at position `idx`
    pub fn take(&mut self, idx: usize) -> Option<WireHandle> {
        let mut cursor = &mut self.head;
        while cursor.as_ref().is_some_and(|n| n.idx != idx) {
            cursor = &mut cursor.as_mut()?.next;
        }
        let mut removed = cursor.take()?;
        *cursor = removed.next.take();
        self.len -= 1;
        Some(removed.elem)
    }

    /// Consume the tuple, yielding `(idx, elem)` from index 0 upward
    pub fn drain(mut self) -> std::vec::IntoIter<(usize, WireHandle)> {
        let mut items = Vec::with_capacity(self.len);
        let mut node = self.head.take();
        while let Some(mut n) = node {
            node = n.next.take();
            items.push((n.idx, n.elem));
        }
        self.len = 0;
        items.sort_by_key(|(idx, _)| *idx);
        items.into_iter()
    }
}

/// Elements are numbered in iteration order
impl FromIterator<WireHandle> for WireTuple {
    fn from_iter<I: IntoIterator<Item = WireHandle>>(iter: I) -> Self {
        let elems: Vec<_> = iter.into_iter().collect();
        let mut tuple = WireTuple::new();
        for (idx, elem) in elems.into_iter().enumerate().rev() {
            tuple.push_front(idx, elem);
        }
        tuple
    }
}

impl Drop for WireTuple {
    fn drop(&mut self) {
        // Unlink iteratively so long chains do not recurse
        let mut node = self.head.take();
        while let Some(mut n) = node {
            node = n.next.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::stats::snapshot;
    use crate::wire::WireValue;

    fn ints(t: WireTuple) -> Vec<(usize, i64)> {
        t.drain()
            .map(|(idx, h)| match h.into_value() {
                WireValue::Int64(i) => (idx, i),
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_reverse_build_drains_in_order() {
        let mut t = WireTuple::new();
        for idx in (0..3).rev() {
            t.push_front(idx, WireHandle::int(idx as i64 * 10));
        }
        assert_eq!(t.len(), 3);
        assert_eq!(ints(t), vec![(0, 0), (1, 10), (2, 20)]);
    }

    #[test]
    fn test_out_of_order_pushes_drain_sorted() {
        let mut t = WireTuple::new();
        t.push_front(0, WireHandle::int(0));
        t.push_front(2, WireHandle::int(2));
        t.push_front(1, WireHandle::int(1));
        assert_eq!(ints(t), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_collect_numbers_in_order() {
        let t: WireTuple = [7, 8, 9].into_iter().map(WireHandle::int).collect();
        assert!(matches!(t.get(0).map(|h| h.value()), Some(WireValue::Int64(7))));
        assert_eq!(ints(t), vec![(0, 7), (1, 8), (2, 9)]);
    }

    #[test]
    fn test_take_unlinks() {
        let mut t = WireTuple::new();
        t.push_front(1, WireHandle::int(1));
        t.push_front(0, WireHandle::int(0));
        let taken = t.take(1).unwrap();
        assert_eq!(taken.kind(), crate::wire::WireKind::Int64);
        assert_eq!(t.len(), 1);
        assert!(t.take(1).is_none());
        assert!(t.get(0).is_some());
    }

    #[test]
    fn test_drop_frees_every_element() {
        let before = snapshot();
        {
            let mut t = WireTuple::new();
            for idx in (0..1000).rev() {
                t.push_front(idx, WireHandle::int(0));
            }
        }
        assert_eq!(snapshot().since(&before).live(), 0);
    }
}
