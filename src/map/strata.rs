//! StrataMap: the hierarchy owner
//!
//! Holds the level vector, the per-level position models, and the query
//! surface. The write path (insert, erase, cascade merge) lives in
//! `merge.rs`; the merging iterator in `iter.rs`.
//!
//! ## Recency
//! For any key, the lowest-indexed non-empty level holding a record for it
//! is authoritative. Queries therefore scan levels bottom-up and stop at the
//! first hit; a tombstone hit answers "absent" without looking further up.

use std::cmp::Ordering;

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::model::{PiecewiseLinearModel, PositionModel};

use super::iter::Iter;
use super::{Item, Level};

/// A dynamic, learned, ordered key→value map
///
/// Writes enter a small sorted buffer (the bottom level) and drift upward
/// through geometrically sized sorted runs during merges. Levels of at least
/// `2^min_indexed_level` items carry a position model `M` that narrows
/// lookups to a small range refined by binary search.
pub struct StrataMap<K, V, M = PiecewiseLinearModel> {
    /// Tuning parameters, fixed at construction
    pub(crate) config: Config,

    /// One past the highest level that may hold data
    pub(crate) used_levels: u32,

    /// Level `i` lives at slot `i - min_level`
    pub(crate) levels: Vec<Level<K, V>>,

    /// Model for level `i` lives at slot `i - min_indexed_level`
    pub(crate) models: Vec<M>,
}

impl<K: Ord, V, M: PositionModel<K>> StrataMap<K, V, M> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create an empty map with the default configuration
    pub fn new() -> Self {
        Self::empty_with_config(Config::default())
    }

    /// Create an empty map with a custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Self::check_model(&config)?;
        Ok(Self::empty_with_config(config))
    }

    /// Bulk-construct from records sorted by key
    ///
    /// Input must be non-decreasing in key; of each equal-key group the
    /// first record is kept. The whole input lands in the smallest level
    /// whose capacity fits it, leaving the lower levels empty for writes.
    pub fn from_sorted<I>(input: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_sorted_with_config(Config::default(), input)
    }

    /// Bulk-construct with a custom configuration
    pub fn from_sorted_with_config<I>(config: Config, input: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        config.validate()?;
        Self::check_model(&config)?;

        let mut items: Vec<Item<K, V>> = Vec::new();
        let mut raw_count = 0usize;
        for (position, (key, value)) in input.into_iter().enumerate() {
            raw_count += 1;
            if let Some(last) = items.last() {
                match key.cmp(last.key()) {
                    Ordering::Less => return Err(StrataError::UnsortedInput { position }),
                    Ordering::Equal => continue, // first occurrence wins
                    Ordering::Greater => {}
                }
            }
            items.push(Item::live(key, value));
        }

        if items.is_empty() {
            return Ok(Self::empty_with_config(config));
        }

        // Sized from the raw count, as if every record had been distinct
        let target = ceil_log2(raw_count).max(config.min_level);
        let mut map = Self::empty_with_config(config);
        map.used_levels = target + 1;

        let top_slot = map.config.level_slot(target.max(map.config.max_fully_allocated_level));
        while map.levels.len() <= top_slot {
            map.levels.push(Level::new());
        }

        let entries = items.len();
        let slot = map.config.level_slot(target);
        map.levels[slot].absorb(items);

        if target >= map.config.min_indexed_level {
            let model_slots = map.config.model_slot(target) + 1;
            map.models = (0..model_slots).map(|_| M::default()).collect();
            let model = M::build(map.levels[slot].items().iter().map(Item::key));
            map.models[model_slots - 1] = model;
        }

        tracing::debug!(entries, level = target, "bulk-loaded sorted input");
        Ok(map)
    }

    /// Empty hierarchy with the reserve band pre-allocated
    fn empty_with_config(config: Config) -> Self {
        let top_slot = config
            .level_slot((config.init_levels - 1).max(config.max_fully_allocated_level));
        let mut levels: Vec<Level<K, V>> = (0..=top_slot).map(|_| Level::new()).collect();

        levels[0].reserve(config.bottom_capacity());
        for level in (config.min_level + 1)..=config.max_fully_allocated_level {
            levels[config.level_slot(level)].reserve(1usize << level);
        }

        Self {
            used_levels: config.min_level,
            levels,
            models: Vec::new(),
            config,
        }
    }

    /// Reject model/configuration pairs whose search range would span an
    /// entire indexed level.
    fn check_model(config: &Config) -> Result<()> {
        if let Some(epsilon) = M::epsilon() {
            if 2 * epsilon >= (1usize << config.min_indexed_level) {
                return Err(StrataError::Config(format!(
                    "model error bound {} is too wide for min_indexed_level {}",
                    epsilon, config.min_indexed_level
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Point Queries
    // =========================================================================

    /// Look up the newest live value for `key`
    ///
    /// Levels are scanned bottom-up; the first record found is authoritative.
    /// A tombstone therefore hides any older record above it.
    pub fn find(&self, key: &K) -> Option<&V> {
        for level_idx in self.config.min_level..self.used_levels {
            let level = self.level(level_idx);
            if level.is_empty() {
                continue;
            }
            let pos = self.level_lower_bound(level_idx, key);
            if let Some(item) = level.items().get(pos) {
                if item.key() == key {
                    return item.value();
                }
            }
        }
        None
    }

    /// Number of records with this key: 0 or 1
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.find(key).is_some())
    }

    /// First live, non-shadowed record with key not less than `key`
    ///
    /// Routed through the merging iterator, so a tombstone in a lower level
    /// hides older records above it: the answer is always consistent with a
    /// full scan. One cursor per non-empty level is positioned for this, so
    /// the call costs `O(levels · log)` even when the result is the very
    /// first candidate.
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.iter_from(key).next()
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// All live, non-shadowed records in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V, M> {
        Iter::all(self)
    }

    /// Live, non-shadowed records with key not less than `key`, ascending
    pub fn iter_from(&self, key: &K) -> Iter<'_, K, V, M> {
        Iter::from_key(self, key)
    }

    /// True when no live record exists
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// One past the highest level that may hold data
    pub fn used_levels(&self) -> u32 {
        self.used_levels
    }

    /// Item counts for levels `min_level..used_levels`
    pub fn level_sizes(&self) -> Vec<usize> {
        (self.config.min_level..self.used_levels)
            .map(|level| self.level(level).len())
            .collect()
    }

    /// Bytes held by the level data plus the models
    pub fn size_in_bytes(&self) -> usize {
        let data: usize = self
            .levels
            .iter()
            .map(|level| level.len() * std::mem::size_of::<Item<K, V>>())
            .sum();
        let spine = self.levels.len() * std::mem::size_of::<Level<K, V>>();
        data + spine + self.index_size_in_bytes()
    }

    /// Bytes held by the position models alone
    pub fn index_size_in_bytes(&self) -> usize {
        self.models.iter().map(M::size_in_bytes).sum()
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    pub(crate) fn level(&self, level: u32) -> &Level<K, V> {
        &self.levels[self.config.level_slot(level)]
    }

    pub(crate) fn model(&self, level: u32) -> &M {
        &self.models[self.config.model_slot(level)]
    }

    /// Lower bound within one level, model-narrowed on indexed levels
    pub(crate) fn level_lower_bound(&self, level_idx: u32, key: &K) -> usize {
        let level = self.level(level_idx);
        if level_idx >= self.config.min_indexed_level {
            let range = self.model(level_idx).search(key);
            let hi = range.hi.min(level.len());
            let lo = range.lo.min(hi);
            level.lower_bound_in(lo, hi, key)
        } else {
            level.lower_bound(key)
        }
    }
}

impl<K: Ord, V, M: PositionModel<K>> Default for StrataMap<K, V, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: Ord, V, M: PositionModel<K>> IntoIterator for &'a StrataMap<K, V, M> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Smallest `p` with `2^p >= n`, for `n >= 1`
fn ceil_log2(n: usize) -> u32 {
    n.next_power_of_two().trailing_zeros()
}
