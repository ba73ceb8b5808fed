//! Packrat memoization.
//!
//! The table is open-addressed and keyed by start offset: a slot holds one
//! offset plus the head of a singly-linked chain of per-node entries
//! memoized at that offset. Collisions probe linearly; growth doubles the
//! slot array and rehashes. A cut releases every entry recorded below the
//! cut offset in one sweep (including entries that probing displaced past
//! their home slot) and advances the low-water mark so later cuts skip
//! already-released ground.

use sprout_graph::NodeId;

use crate::outcome::Outcome;

/// The pluggable memoization seam.
///
/// The engine asks for a cached outcome before dispatching a `MEMOIZE`
/// node, stores the outcome (success or remembered failure) afterwards,
/// and reports cut offsets so the strategy may release dead entries.
/// Absence is never an error, just "not memoized yet".
pub trait MemoStrategy {
    /// Cached outcome of `node` at `offset`, if any.
    fn get(&self, node: NodeId, offset: u32) -> Option<&Outcome>;

    /// Remember the outcome of `node` at `offset`.
    fn memoize(&mut self, node: NodeId, offset: u32, outcome: Outcome);

    /// Positions below `offset` will not be revisited; entries there may
    /// be released.
    fn cut(&mut self, offset: u32);
}

const VACANT: u32 = u32::MAX;

#[derive(Clone, Debug)]
struct Slot {
    offset: u32,
    head: u32,
}

#[derive(Clone, Debug)]
struct Entry {
    node: NodeId,
    offset: u32,
    outcome: Outcome,
    next: u32,
}

/// The default open-addressed packrat table.
#[derive(Debug, Default)]
pub struct PackratMemo {
    slots: Vec<Slot>,
    entries: Vec<Entry>,
    occupied: usize,
    earliest: u32,
}

impl PackratMemo {
    const INITIAL_SLOTS: usize = 64;

    pub fn new() -> Self {
        PackratMemo::default()
    }

    /// Offsets below this have been released by a cut.
    pub fn earliest_releasable(&self) -> u32 {
        self.earliest
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slot index holding `offset`, or the vacant slot where it belongs.
    fn probe(&self, offset: u32) -> usize {
        debug_assert!(!self.slots.is_empty());
        let mut index = offset as usize % self.slots.len();
        loop {
            let slot = &self.slots[index];
            if slot.offset == offset || slot.offset == VACANT {
                return index;
            }
            index = (index + 1) % self.slots.len();
        }
    }

    fn insert(&mut self, node: NodeId, offset: u32, outcome: Outcome) {
        let index = self.probe(offset);
        let slot = &mut self.slots[index];
        let head = if slot.offset == VACANT {
            slot.offset = offset;
            self.occupied += 1;
            VACANT
        } else {
            slot.head
        };
        let entry = u32::try_from(self.entries.len()).unwrap_or(VACANT);
        self.entries.push(Entry {
            node,
            offset,
            outcome,
            next: head,
        });
        self.slots[index].head = entry;
    }

    /// Re-home all surviving entries into a fresh slot array.
    fn rebuild(&mut self, capacity: usize, survivors: Vec<Entry>) {
        self.slots = vec![
            Slot {
                offset: VACANT,
                head: VACANT,
            };
            capacity
        ];
        self.entries = Vec::with_capacity(survivors.len());
        self.occupied = 0;
        for entry in survivors {
            self.insert(entry.node, entry.offset, entry.outcome);
        }
    }

    fn grow(&mut self) {
        let capacity = (self.slots.len() * 2).max(Self::INITIAL_SLOTS);
        let survivors = std::mem::take(&mut self.entries);
        self.rebuild(capacity, survivors);
    }
}

impl MemoStrategy for PackratMemo {
    fn get(&self, node: NodeId, offset: u32) -> Option<&Outcome> {
        if self.slots.is_empty() {
            return None;
        }
        let index = self.probe(offset);
        if self.slots[index].offset != offset {
            return None;
        }
        let mut cursor = self.slots[index].head;
        while cursor != VACANT {
            let entry = &self.entries[cursor as usize];
            if entry.node == node {
                return Some(&entry.outcome);
            }
            cursor = entry.next;
        }
        None
    }

    fn memoize(&mut self, node: NodeId, offset: u32, outcome: Outcome) {
        // keep the load factor under 3/4, counting occupied slots
        if (self.occupied + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }
        self.insert(node, offset, outcome);
    }

    fn cut(&mut self, offset: u32) {
        if offset <= self.earliest {
            return;
        }
        self.earliest = offset;
        if self.entries.is_empty() {
            return;
        }
        let capacity = self.slots.len();
        let survivors = std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|e| e.offset >= offset)
            .collect();
        self.rebuild(capacity, survivors);
    }
}

/// Memoization disabled.
#[derive(Debug, Default)]
pub struct NullMemo;

impl MemoStrategy for NullMemo {
    fn get(&self, _node: NodeId, _offset: u32) -> Option<&Outcome> {
        None
    }

    fn memoize(&mut self, _node: NodeId, _offset: u32, _outcome: Outcome) {}

    fn cut(&mut self, _offset: u32) {}
}
