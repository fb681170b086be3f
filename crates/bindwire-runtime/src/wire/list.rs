//! Wire lists: append during construction, pop from the end when draining

use super::WireHandle;

#[derive(Debug, Default)]
pub struct WireList {
    items: Vec<WireHandle>,
}

impl WireList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, elem: WireHandle) {
        self.items.push(elem);
    }

    /// Remove the element at the last index
    pub fn pop(&mut self) -> Option<WireHandle> {
        self.items.pop()
    }

    pub fn get(&self, idx: usize) -> Option<&WireHandle> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<WireHandle>> for WireList {
    fn from(items: Vec<WireHandle>) -> Self {
        Self { items }
    }
}

impl FromIterator<WireHandle> for WireList {
    fn from_iter<I: IntoIterator<Item = WireHandle>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<WireHandle> for WireList {
    fn extend<I: IntoIterator<Item = WireHandle>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_from_end() {
        let mut list = WireList::with_capacity(2);
        list.push(WireHandle::int(1));
        list.push(WireHandle::int(2));
        assert_eq!(list.len(), 2);
        let last = list.pop().unwrap();
        assert!(matches!(last.value(), crate::wire::WireValue::Int64(2)));
        assert_eq!(list.len(), 1);
        list.pop();
        assert!(list.pop().is_none());
        assert!(list.is_empty());
    }
}
