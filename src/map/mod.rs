//! Map Module
//!
//! The dynamic learned index: a logarithmic-method buffer hierarchy layered
//! over per-level position models.
//!
//! ## Responsibilities
//! - Maintain geometrically sized, always-sorted levels (level `i` holds at
//!   most `2^i` items)
//! - Route writes through the bottom level and cascade overflows upward with
//!   a pairwise ping-pong merge
//! - Reconcile tombstones during merges; eliminate them at the topmost level
//! - Answer point and range queries from the lowest (newest) level that
//!   knows the key
//!
//! ## Data Structure Choice
//! Plain sorted `Vec` runs per level:
//! - Binary search within a level, model-narrowed above `min_indexed_level`
//! - Contiguous storage keeps merges sequential and allocator-friendly
//! - Capacity for the always-reserved band survives clears

mod item;
mod iter;
mod level;
mod merge;
mod strata;

pub use iter::Iter;
pub use strata::StrataMap;

pub(crate) use item::Item;
pub(crate) use level::Level;
