//! Recency order for cache entries
//!
//! Entries live in an arena and link to their neighbours by slot index, so a
//! [`Handle`] stays valid until its entry is popped or removed. `head` is the
//! least recently used entry, `tail` the most recently used.

use std::iter::FusedIterator;

/// Stable reference to a linked entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle(usize);

/// Entry in the recency list
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked list of entries backed by a slot arena
pub(crate) struct OrderList<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> OrderList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Append a new most recently used entry
    pub(crate) fn push_back(&mut self, key: K, value: V) -> Handle {
        let idx = self.alloc_slot();
        self.slots[idx] = Some(Entry {
            key,
            value,
            prev: None,
            next: None,
        });
        self.link_back(idx);
        self.len += 1;
        Handle(idx)
    }

    /// Make `handle` the most recently used entry
    pub(crate) fn move_to_back(&mut self, handle: Handle) {
        let idx = handle.0;
        if self.tail == Some(idx) || !self.is_live(idx) {
            return;
        }

        self.unlink(idx);
        self.link_back(idx);
    }

    /// Unlink and return the least recently used entry
    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        let idx = self.head?;
        self.remove(Handle(idx))
    }

    /// Unlink `handle` and return its key and value
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let idx = handle.0;
        if !self.is_live(idx) {
            return None;
        }

        self.unlink(idx);
        let entry = self.slots[idx].take()?;
        self.free_list.push(idx);
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    pub(crate) fn front(&self) -> Option<(&K, &V)> {
        self.head
            .and_then(|idx| self.slots[idx].as_ref())
            .map(|entry| (&entry.key, &entry.value))
    }

    pub(crate) fn value(&self, handle: Handle) -> Option<&V> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .map(|entry| &entry.value)
    }

    pub(crate) fn value_mut(&mut self, handle: Handle) -> Option<&mut V> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .map(|entry| &mut entry.value)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate from least to most recently used
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Number of arena slots ever allocated, live or free
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Handle of the entry `position` steps from the head
    #[cfg(test)]
    pub(crate) fn handle_at(&self, position: usize) -> Option<Handle> {
        let mut cursor = self.head;
        for _ in 0..position {
            cursor = cursor.and_then(|idx| self.slots[idx].as_ref()).and_then(|e| e.next);
        }
        cursor.map(Handle)
    }

    /// Walk the links in both directions and check them against `len`
    #[cfg(test)]
    pub(crate) fn check_links(&self) {
        let mut seen = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let entry = self.slots[idx].as_ref().expect("linked slot is vacant");
            assert_eq!(entry.prev, prev, "broken prev link at slot {}", idx);
            seen += 1;
            assert!(seen <= self.len, "cycle in recency list");
            prev = Some(idx);
            cursor = entry.next;
        }
        assert_eq!(seen, self.len);
        assert_eq!(self.tail, prev);
        assert_eq!(self.head.is_none(), self.tail.is_none());
        if self.len == 1 {
            assert_eq!(self.head, self.tail);
        }
        assert_eq!(self.slots.len(), self.len + self.free_list.len());
    }

    fn is_live(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Some(_)))
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(entry) = &mut self.slots[idx] {
            entry.prev = old_tail;
            entry.next = None;
        }

        match old_tail {
            Some(tail_idx) => {
                if let Some(tail) = &mut self.slots[tail_idx] {
                    tail.next = Some(idx);
                }
            }
            None => {
                self.head = Some(idx);
            }
        }

        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &mut self.slots[idx] {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = &mut self.slots[prev_idx] {
                    prev_entry.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = &mut self.slots[next_idx] {
                    next_entry.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(None);
            idx
        }
    }
}

/// Iterator over cache entries from least to most recently used
///
/// Created by [`LruCache::iter`](crate::LruCache::iter).
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Entry<K, V>>],
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.slots[self.front?].as_ref()?;
        self.front = entry.next;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.slots[self.back?].as_ref()?;
        self.back = entry.prev;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
