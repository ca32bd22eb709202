//! Orbis Merge Engine
//!
//! Pure join/derive logic, no I/O.
//! Takes raw countries + exchange rates → returns merged records.
//!
//! The only non-determinism is the GDP multiplier, which is injected through
//! [`GdpMultiplier`] so tests can pin it.

#![warn(clippy::all)]

pub mod merge;
pub mod multiplier;

pub use merge::{estimate_gdp, MergeEngine, MergeStats};
pub use multiplier::{
    FixedMultiplier, GdpMultiplier, RandomMultiplier, SeededMultiplier, GDP_MULTIPLIER_MAX,
    GDP_MULTIPLIER_MIN,
};
