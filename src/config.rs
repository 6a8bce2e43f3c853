//! Configuration for StrataKV
//!
//! Centralized configuration with sensible defaults.
//!
//! The four parameters shape the level hierarchy:
//! - `min_level`: the bottom level holds up to `2^(min_level+1) - 1` items,
//!   so smaller values lower the memory floor but raise write amplification.
//! - `min_indexed_level`: levels below this use plain binary search; levels
//!   at or above it carry a learned position model.
//! - `max_fully_allocated_level`: levels up to this index keep their
//!   reserved capacity when emptied; above it, storage is released.
//! - `init_levels`: number of level slots created up front by the empty
//!   constructor.

use crate::error::{Result, StrataError};

/// Largest admissible level number, so `1usize << level` cannot overflow.
const LEVEL_LIMIT: u32 = 48;

/// Tuning parameters for a [`StrataMap`](crate::StrataMap) instance
#[derive(Debug, Clone)]
pub struct Config {
    /// Bottom level of the hierarchy (the insertion buffer)
    pub min_level: u32,

    /// First level that carries a learned position model
    pub min_indexed_level: u32,

    /// Cutoff above which emptied levels release their memory
    pub max_fully_allocated_level: u32,

    /// Number of level slots pre-allocated by the empty constructor
    pub init_levels: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_level: 6,
            min_indexed_level: 18,
            max_fully_allocated_level: 15,
            init_levels: 15,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the parameter combination
    ///
    /// Returns `Err(StrataError::Config)` when the parameters cannot form a
    /// valid hierarchy.
    pub fn validate(&self) -> Result<()> {
        if self.min_level == 0 {
            return Err(StrataError::Config("min_level must be at least 1".into()));
        }
        if self.min_indexed_level <= self.min_level {
            return Err(StrataError::Config(format!(
                "min_indexed_level ({}) must exceed min_level ({})",
                self.min_indexed_level, self.min_level
            )));
        }
        if self.max_fully_allocated_level <= self.min_level {
            return Err(StrataError::Config(format!(
                "max_fully_allocated_level ({}) must exceed min_level ({})",
                self.max_fully_allocated_level, self.min_level
            )));
        }
        if self.init_levels <= self.min_level {
            return Err(StrataError::Config(format!(
                "init_levels ({}) must exceed min_level ({})",
                self.init_levels, self.min_level
            )));
        }
        if self.max_fully_allocated_level > LEVEL_LIMIT || self.min_indexed_level > LEVEL_LIMIT {
            return Err(StrataError::Config(format!(
                "level numbers are limited to {}",
                LEVEL_LIMIT
            )));
        }
        Ok(())
    }

    /// Capacity of the bottom level: `2^(min_level+1) - 1`
    pub(crate) fn bottom_capacity(&self) -> usize {
        (1usize << (self.min_level + 1)) - 1
    }

    /// Index into the level vector for a level number
    pub(crate) fn level_slot(&self, level: u32) -> usize {
        (level - self.min_level) as usize
    }

    /// Index into the model vector for a level number
    pub(crate) fn model_slot(&self, level: u32) -> usize {
        (level - self.min_indexed_level) as usize
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn min_level(mut self, min_level: u32) -> Self {
        self.config.min_level = min_level;
        self
    }

    pub fn min_indexed_level(mut self, min_indexed_level: u32) -> Self {
        self.config.min_indexed_level = min_indexed_level;
        self
    }

    pub fn max_fully_allocated_level(mut self, max_fully_allocated_level: u32) -> Self {
        self.config.max_fully_allocated_level = max_fully_allocated_level;
        self
    }

    pub fn init_levels(mut self, init_levels: u32) -> Self {
        self.config.init_levels = init_levels;
        self
    }

    /// Validate and produce the final Config
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
