//! Merging iterator
//!
//! A forward-only multi-way merge over every non-empty level, yielding live,
//! non-shadowed records in ascending key order. One cursor per level sits in
//! a min-heap keyed by the cursor's current key; equal keys are popped
//! lowest-level-first so the first pop of a group is the authoritative
//! (newest) record and the remaining duplicates are coalesced away. A
//! tombstone surviving coalescing hides its key and the scan moves on.
//!
//! Cursor seeds are positioned at construction (model-narrowed on indexed
//! levels); heap construction itself is deferred to the first `next` call.
//! The `&self` borrow keeps the map immutable for the iterator's lifetime,
//! so a stale iterator cannot observe a mutation.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::model::{PiecewiseLinearModel, PositionModel};

use super::strata::StrataMap;
use super::Item;

/// One level's position within the merge
struct Cursor<'a, K, V> {
    item: &'a Item<K, V>,
    level: u32,
    pos: usize,
}

impl<K: Ord, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.item.key() == other.item.key() && self.level == other.level
    }
}

impl<K: Ord, V> Eq for Cursor<'_, K, V> {}

impl<K: Ord, V> PartialOrd for Cursor<'_, K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for Cursor<'_, K, V> {
    /// Reversed so the max-heap pops the smallest key, ties lowest level
    /// (newest record) first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .item
            .key()
            .cmp(self.item.key())
            .then_with(|| other.level.cmp(&self.level))
    }
}

/// Ascending iterator over the live records of a [`StrataMap`]
pub struct Iter<'a, K, V, M = PiecewiseLinearModel> {
    map: &'a StrataMap<K, V, M>,
    seeds: Vec<Cursor<'a, K, V>>,
    heap: BinaryHeap<Cursor<'a, K, V>>,
    started: bool,
}

impl<'a, K: Ord, V, M: PositionModel<K>> Iter<'a, K, V, M> {
    /// Iterator over the whole map
    pub(crate) fn all(map: &'a StrataMap<K, V, M>) -> Self {
        let mut seeds = Vec::new();
        for level_idx in map.config.min_level..map.used_levels {
            if let Some(item) = map.level(level_idx).items().first() {
                seeds.push(Cursor {
                    item,
                    level: level_idx,
                    pos: 0,
                });
            }
        }
        Self {
            map,
            seeds,
            heap: BinaryHeap::new(),
            started: false,
        }
    }

    /// Iterator positioned at the first key not less than `key`
    pub(crate) fn from_key(map: &'a StrataMap<K, V, M>, key: &K) -> Self {
        let mut seeds = Vec::new();
        for level_idx in map.config.min_level..map.used_levels {
            let level = map.level(level_idx);
            if level.is_empty() {
                continue;
            }
            let pos = map.level_lower_bound(level_idx, key);
            if let Some(item) = level.items().get(pos) {
                seeds.push(Cursor {
                    item,
                    level: level_idx,
                    pos,
                });
            }
        }
        Self {
            map,
            seeds,
            heap: BinaryHeap::new(),
            started: false,
        }
    }

    /// Re-arm a popped cursor at its level's next position
    fn push_successor(&mut self, cursor: &Cursor<'a, K, V>) {
        let next = cursor.pos + 1;
        if let Some(item) = self.map.level(cursor.level).items().get(next) {
            self.heap.push(Cursor {
                item,
                level: cursor.level,
                pos: next,
            });
        }
    }
}

impl<'a, K: Ord, V, M: PositionModel<K>> Iterator for Iter<'a, K, V, M> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            self.heap = BinaryHeap::from(std::mem::take(&mut self.seeds));
        }

        loop {
            let head = self.heap.pop()?;
            self.push_successor(&head);

            // Coalesce the older duplicates of this key
            loop {
                let duplicate = matches!(
                    self.heap.peek(),
                    Some(top) if top.item.key() == head.item.key()
                );
                if !duplicate {
                    break;
                }
                if let Some(shadowed) = self.heap.pop() {
                    self.push_successor(&shadowed);
                }
            }

            if let Some(value) = head.item.value() {
                return Some((head.item.key(), value));
            }
            // Tombstone: the key is deleted, keep scanning
        }
    }
}
