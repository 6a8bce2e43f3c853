//! # StrataKV
//!
//! A dynamic learned index: an ordered key→value map with:
//! - Amortized-logarithmic insertion via geometrically sized sorted runs
//! - Tombstone-based deletion reconciled during merges
//! - Learned per-level position models that narrow lookups to a small range
//! - A lazy multi-way merging iterator for ordered scans
//!
//! ## Architecture Overview
//!
//! ```text
//! insert / erase                    find / lower_bound / iter
//!       │                                     │
//!       ▼                                     ▼
//! ┌─────────────┐  overflow cascade   ┌──────────────────┐
//! │  Level 6    │ ───────────────────▶│  binary search   │
//! │ (insertion  │                     │  (levels < 18)   │
//! │   buffer)   │                     └──────────────────┘
//! ├─────────────┤                     ┌──────────────────┐
//! │  Level 7    │                     │  position model  │
//! │    ...      │ ───────────────────▶│  + local binary  │
//! │  Level i    │   model narrows     │  search (≥ 18)   │
//! │ (≤ 2^i item)│   to [lo, hi)       └──────────────────┘
//! └─────────────┘
//! ```
//!
//! Each level holds at most `2^i` items in strictly ascending key order.
//! Writes enter the bottom level; when it overflows, a pairwise logarithmic
//! merge relocates the data into the smallest level with room, eliminating
//! shadowed versions on the way and tombstones once they reach the topmost
//! used level.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod model;
pub mod map;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StrataError};
pub use config::{Config, ConfigBuilder};
pub use map::{Iter, StrataMap};
pub use model::{ApproxRange, FullScanModel, ModelKey, PiecewiseLinearModel, PositionModel};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
