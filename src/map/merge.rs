//! Write path: insertion, erasure, and the pairwise logarithmic merge
//!
//! Every mutation enters the bottom level. When the bottom level overflows,
//! the cascade picks the smallest level with room for everything beneath it
//! and relocates levels `min_level..target` (plus the target's own data,
//! when present) through a chain of 2-way merges alternating between two
//! scratch buffers. The buffer parity is chosen from the number of merge
//! steps so the final pass always lands in the buffer that becomes the
//! target level, sparing a copy.
//!
//! ## Tombstones
//! A merge step keeps tombstones so they continue to shadow older versions
//! above, except at the step whose older input is the topmost used level:
//! there a tombstone can shadow nothing further, so none is emitted.

use std::cmp::Ordering;

use crate::model::PositionModel;

use super::strata::StrataMap;
use super::{Item, Level};

impl<K: Ord, V, M: PositionModel<K>> StrataMap<K, V, M> {
    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert a record, replacing any current value for the key
    pub fn insert(&mut self, key: K, value: V) {
        self.insert_item(Item::live(key, value));
    }

    /// Remove a record
    ///
    /// A tombstone is placed unconditionally, even for absent keys, and
    /// reconciled during future merges.
    pub fn erase(&mut self, key: K) {
        self.insert_item(Item::tombstone(key));
    }

    fn insert_item(&mut self, item: Item<K, V>) {
        let min_level = self.config.min_level;
        let bottom_capacity = self.config.bottom_capacity();

        let bottom = &mut self.levels[0];
        let pos = bottom.lower_bound(item.key());

        // The one case where an update happens in place without cascading
        if pos < bottom.len() && bottom.items()[pos].key() == item.key() {
            bottom.overwrite(pos, item);
            return;
        }

        if bottom.len() < bottom_capacity {
            bottom.insert_at(pos, item);
            if self.used_levels == min_level {
                self.used_levels = min_level + 1;
            }
            return;
        }

        // Bottom level full: find the smallest level able to absorb it plus
        // every level in between.
        let mut slots_required = bottom_capacity + 1;
        let mut target = min_level + 1;
        while target < self.used_levels {
            let len = self.level(target).len();
            let slots_left = (1usize << target) - len;
            if slots_required <= slots_left {
                break;
            }
            slots_required += len;
            target += 1;
        }

        if target == self.used_levels {
            self.open_level(target);
        }

        tracing::debug!(target_level = target, slots_required, "bottom level full, cascading merge");
        self.cascade_merge(item, pos, target, slots_required);
    }

    /// Extend the hierarchy by one level at the top
    fn open_level(&mut self, level: u32) {
        self.used_levels = level + 1;

        let slot = self.config.level_slot(level);
        if self.levels.len() <= slot {
            self.levels.push(Level::new());
        }
        debug_assert!(self.levels.len() > slot);

        if level >= self.config.min_indexed_level {
            let model_slot = self.config.model_slot(level);
            if self.models.len() <= model_slot {
                self.models.push(M::default());
            }
        }

        tracing::trace!(level, "opened new top level");
    }

    // =========================================================================
    // Pairwise Logarithmic Merge
    // =========================================================================

    /// Merge levels `min_level..target` together with `new_item` into
    /// `target`, emptying every contributing level.
    ///
    /// `insertion_point` is the new item's sorted position within the bottom
    /// level, already computed by the caller.
    fn cascade_merge(
        &mut self,
        new_item: Item<K, V>,
        insertion_point: usize,
        target: u32,
        slots_required: usize,
    ) {
        let min_level = self.config.min_level;
        let min_indexed_level = self.config.min_indexed_level;
        let max_fully_allocated_level = self.config.max_fully_allocated_level;

        let target_len = self.level(target).len();
        debug_assert!((1usize << target) - target_len >= (1usize << (min_level + 1)));

        // A non-empty target participates as the final merge input
        let limit = if target_len == 0 { target - 1 } else { target };
        let steps = (limit - min_level) as usize;
        // After `steps` buffer flips the run must sit in B
        let start_in_a = steps % 2 == 1;

        let mut buf_a: Vec<Item<K, V>> = Vec::with_capacity(slots_required);
        let mut buf_b: Vec<Item<K, V>> = Vec::with_capacity(slots_required + target_len);

        // Splice the new item into the bottom level's run on its way out
        {
            let first = if start_in_a { &mut buf_a } else { &mut buf_b };
            let mut bottom = self.levels[0].drain_all();
            first.extend(bottom.by_ref().take(insertion_point));
            first.push(new_item);
            first.extend(bottom);
        }

        let mut run_in_a = start_in_a;
        for level_idx in (min_level + 1)..=limit {
            // Tombstones shadow nothing beyond the topmost used level
            let drop_tombstones = level_idx == self.used_levels - 1;
            let slot = self.config.level_slot(level_idx);

            let (input, output) = if run_in_a {
                (&mut buf_a, &mut buf_b)
            } else {
                (&mut buf_b, &mut buf_a)
            };
            output.clear();
            merge_runs(
                input.drain(..),
                self.levels[slot].drain_all(),
                output,
                drop_tombstones,
            );
            run_in_a = !run_in_a;

            if level_idx > max_fully_allocated_level {
                self.levels[slot].release();
            }
            if level_idx >= min_indexed_level {
                self.models[self.config.model_slot(level_idx)] = M::default();
            }
        }
        debug_assert!(!run_in_a, "merge output must land in buffer B");

        let target_slot = self.config.level_slot(target);
        self.levels[target_slot].replace(buf_b);

        if target >= min_indexed_level {
            let entries = self.levels[target_slot].len();
            let model = M::build(self.levels[target_slot].items().iter().map(Item::key));
            self.models[self.config.model_slot(target)] = model;
            tracing::trace!(level = target, entries, "rebuilt position model");
        }
    }
}

// =============================================================================
// Two-way Merge
// =============================================================================

/// Merge two sorted runs, newer shadowing older on equal keys.
///
/// With `drop_tombstones` set no tombstone is emitted at all: a matched pair
/// whose newer record is a tombstone annihilates, and lone tombstones from
/// either run are discarded.
fn merge_runs<K: Ord, V>(
    newer: impl Iterator<Item = Item<K, V>>,
    older: impl Iterator<Item = Item<K, V>>,
    out: &mut Vec<Item<K, V>>,
    drop_tombstones: bool,
) {
    let mut newer = newer;
    let mut older = older;
    let mut next_new = newer.next();
    let mut next_old = older.next();

    loop {
        match (next_new, next_old) {
            (Some(new_item), Some(old_item)) => match new_item.key().cmp(old_item.key()) {
                Ordering::Less => {
                    emit(out, new_item, drop_tombstones);
                    next_new = newer.next();
                    next_old = Some(old_item);
                }
                Ordering::Greater => {
                    emit(out, old_item, drop_tombstones);
                    next_new = Some(new_item);
                    next_old = older.next();
                }
                Ordering::Equal => {
                    // Newer wins; the shadowed record is discarded
                    emit(out, new_item, drop_tombstones);
                    next_new = newer.next();
                    next_old = older.next();
                }
            },
            (Some(new_item), None) => {
                emit(out, new_item, drop_tombstones);
                for item in newer {
                    emit(out, item, drop_tombstones);
                }
                return;
            }
            (None, Some(old_item)) => {
                emit(out, old_item, drop_tombstones);
                for item in older {
                    emit(out, item, drop_tombstones);
                }
                return;
            }
            (None, None) => return,
        }
    }
}

fn emit<K, V>(out: &mut Vec<Item<K, V>>, item: Item<K, V>, drop_tombstones: bool) {
    if !(drop_tombstones && item.is_tombstone()) {
        out.push(item);
    }
}
