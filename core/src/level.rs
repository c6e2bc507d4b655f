//! Currency levels — the order of magnitude an amount is expressed in.
//!
//! RULE: Variant order is the invariant. Each step is a factor of
//! `LEVEL_SCALE` (1000) over the previous one, and transaction math
//! relies on `ordinal()` differences between levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    #[serde(rename = "none")]
    Units,
    K,  // thousands
    M,  // millions
    B,  // billions
    T,  // trillions
    Q,  // quadrillions
    QQ, // quintillions
}

const ALL: [Level; 7] = [
    Level::Units,
    Level::K,
    Level::M,
    Level::B,
    Level::T,
    Level::Q,
    Level::QQ,
];

impl Level {
    pub const MIN: Level = Level::Units;
    pub const MAX: Level = Level::QQ;

    pub fn all() -> &'static [Level] {
        &ALL
    }

    pub fn ordinal(self) -> i32 {
        self as i32
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Level> {
        usize::try_from(ordinal).ok().and_then(|i| ALL.get(i).copied())
    }

    /// Signed number of steps from `self` to `other`.
    pub fn distance_to(self, other: Level) -> i32 {
        other.ordinal() - self.ordinal()
    }

    /// Next level up, or `None` at `Level::MAX`.
    pub fn up(self) -> Option<Level> {
        Level::from_ordinal(i64::from(self.ordinal()) + 1)
    }

    /// Next level down, or `None` at `Level::MIN`.
    pub fn down(self) -> Option<Level> {
        Level::from_ordinal(i64::from(self.ordinal()) - 1)
    }

    /// Display suffix. The base level has none.
    pub fn suffix(self) -> &'static str {
        match self {
            Level::Units => "",
            Level::K => "K",
            Level::M => "M",
            Level::B => "B",
            Level::T => "T",
            Level::Q => "Q",
            Level::QQ => "QQ",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Units => f.write_str("none"),
            other => f.write_str(other.suffix()),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Level::Units),
            "K" => Ok(Level::K),
            "M" => Ok(Level::M),
            "B" => Ok(Level::B),
            "T" => Ok(Level::T),
            "Q" => Ok(Level::Q),
            "QQ" => Ok(Level::QQ),
            other => Err(format!("unknown currency level '{other}'")),
        }
    }
}
