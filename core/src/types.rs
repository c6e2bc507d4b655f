//! Shared primitive types used across the crate.

/// A currency amount expressed in the units of some `Level`.
pub type Amount = f64;

/// Stable identifier for a persisted purse.
pub type PurseId = String;

/// Magnitude step between adjacent levels.
pub const LEVEL_SCALE: Amount = 1000.0;
