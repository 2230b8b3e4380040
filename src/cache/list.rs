//! LRU List Module
//!
//! Doubly linked recency list threaded through an arena of records.
//!
//! Records are addressed by slot index, never by reference, so unlinking and
//! relinking is an index update and a recycled slot cannot leave a dangling
//! neighbour behind. A sentinel (`SENTINEL`) anchors both ends:
//!
//! ```text
//!   sentinel.next ─► [MRU] ◄──► ... ◄──► [LRU] ◄─ sentinel.prev
//! ```
//!
//! An empty list has both sentinel links pointing back at the sentinel. An
//! unlinked record has both of its own links pointing at itself.

use crate::cache::entry::{CacheEntry, SlotState};

/// Slot index reserved for the sentinel node.
const SENTINEL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Links {
    prev: usize,
    next: usize,
}

// == LRU List ==
/// Arena of records plus the MRU→LRU ordering over the linked ones.
#[derive(Debug)]
pub struct LruList<P> {
    slots: Vec<CacheEntry<P>>,
    /// Slots released by eviction or reset, reused before the arena grows
    free: Vec<usize>,
    sentinel: Links,
    len: usize,
}

impl<P> LruList<P> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            sentinel: Links {
                prev: SENTINEL,
                next: SENTINEL,
            },
            len: 0,
        }
    }

    // == Allocate ==
    /// Stores `entry` in a recycled slot if one is free, otherwise a new one.
    ///
    /// The record comes back unlinked; callers splice it in with
    /// [`link_as_most_recent`](Self::link_as_most_recent).
    pub fn allocate(&mut self, mut entry: CacheEntry<P>) -> usize {
        let id = self.free.pop().unwrap_or(self.slots.len());
        entry.prev = id;
        entry.next = id;
        if id == self.slots.len() {
            self.slots.push(entry);
        } else {
            self.slots[id] = entry;
        }
        id
    }

    // == Release ==
    /// Marks an unlinked slot `Free` and makes it available for reuse.
    pub fn release(&mut self, id: usize) {
        debug_assert!(!self.is_linked(id), "releasing a linked slot");
        self.slots[id].state = SlotState::Free;
        self.free.push(id);
    }

    pub fn get(&self, id: usize) -> &CacheEntry<P> {
        &self.slots[id]
    }

    pub fn get_mut(&mut self, id: usize) -> &mut CacheEntry<P> {
        &mut self.slots[id]
    }

    fn links(&self, id: usize) -> Links {
        if id == SENTINEL {
            self.sentinel
        } else {
            let entry = &self.slots[id];
            Links {
                prev: entry.prev,
                next: entry.next,
            }
        }
    }

    fn set_prev(&mut self, id: usize, prev: usize) {
        if id == SENTINEL {
            self.sentinel.prev = prev;
        } else {
            self.slots[id].prev = prev;
        }
    }

    fn set_next(&mut self, id: usize, next: usize) {
        if id == SENTINEL {
            self.sentinel.next = next;
        } else {
            self.slots[id].next = next;
        }
    }

    fn is_linked(&self, id: usize) -> bool {
        let entry = &self.slots[id];
        entry.prev != id || entry.next != id
    }

    // == Link As Most Recent ==
    /// Moves `id` to the MRU end, unlinking it first if needed.
    pub fn link_as_most_recent(&mut self, id: usize) {
        if self.is_linked(id) {
            if self.sentinel.next == id {
                return;
            }
            self.unlink(id);
        }

        let old_head = self.sentinel.next;
        self.set_prev(id, SENTINEL);
        self.set_next(id, old_head);
        self.set_prev(old_head, id);
        self.sentinel.next = id;
        self.len += 1;
    }

    // == Unlink ==
    /// Removes `id` from its position; its links then point at itself.
    pub fn unlink(&mut self, id: usize) {
        if !self.is_linked(id) {
            return;
        }
        let Links { prev, next } = self.links(id);
        self.set_next(prev, next);
        self.set_prev(next, prev);
        self.set_prev(id, id);
        self.set_next(id, id);
        self.len -= 1;
    }

    // == Peek ==
    /// Slot at the MRU end, if any.
    pub fn most_recent(&self) -> Option<usize> {
        (self.sentinel.next != SENTINEL).then_some(self.sentinel.next)
    }

    /// Slot at the LRU end, if any.
    pub fn least_recent(&self) -> Option<usize> {
        (self.sentinel.prev != SENTINEL).then_some(self.sentinel.prev)
    }

    // == Clear ==
    /// Walks the list once, marking every record `Free`, and empties it.
    ///
    /// Arena storage is kept; the freed slots are recycled by later allocations.
    pub fn clear(&mut self) {
        let mut cursor = self.sentinel.next;
        while cursor != SENTINEL {
            let entry = &mut self.slots[cursor];
            let next = entry.next;
            entry.state = SlotState::Free;
            entry.prev = cursor;
            entry.next = cursor;
            self.free.push(cursor);
            cursor = next;
        }
        self.sentinel = Links {
            prev: SENTINEL,
            next: SENTINEL,
        };
        self.len = 0;
    }

    // == Length ==
    /// Returns the number of linked records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated, free or not.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    // == Iteration ==
    /// Walks the records from MRU to LRU.
    pub fn iter(&self) -> Iter<'_, P> {
        Iter {
            list: self,
            cursor: self.sentinel.next,
        }
    }

    /// Walks the list in both directions and checks that the two walks agree
    /// with each other and with `len`.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let forward: Vec<usize> = self.iter().map(|(id, _)| id).collect();
        assert_eq!(forward.len(), self.len, "forward walk length");

        let mut backward = Vec::with_capacity(self.len);
        let mut cursor = self.sentinel.prev;
        while cursor != SENTINEL {
            assert!(backward.len() < self.len, "backward walk does not terminate");
            backward.push(cursor);
            cursor = self.slots[cursor].prev;
        }
        backward.reverse();
        assert_eq!(forward, backward, "forward and backward walks differ");

        let mut seen = std::collections::HashSet::new();
        for id in &forward {
            assert!(seen.insert(*id), "slot {} reachable twice", id);
            assert!(self.slots[*id].is_occupied(), "linked slot {} is free", id);
        }
    }
}

// == Iterator ==
/// Lazy MRU→LRU walk over the linked records.
pub struct Iter<'a, P> {
    list: &'a LruList<P>,
    cursor: usize,
}

impl<'a, P> Iterator for Iter<'a, P> {
    type Item = (usize, &'a CacheEntry<P>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == SENTINEL {
            return None;
        }
        let id = self.cursor;
        let entry = &self.list.slots[id];
        self.cursor = entry.next;
        Some((id, entry))
    }
}
