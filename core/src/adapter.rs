//! Persistence adapter trait and the in-memory adapter.
//!
//! RULE: The purse never knows where its state lives.
//! It talks to storage only through PersistenceAdapter, injected at init.

use crate::{error::PurseResult, level::Level, types::Amount};
use serde::{Deserialize, Serialize};

/// The contract every storage backend must fulfill.
/// There are no default bodies: a backend implements all three.
pub trait PersistenceAdapter {
    /// Persist the purse's current amount and level.
    fn save(&mut self, amount: Amount, level: Level) -> PurseResult<()>;

    /// Load the stored amount. Called once, at init.
    fn load_amount(&mut self) -> PurseResult<Amount>;

    /// Load the stored level. Called once, at init, after `load_amount`.
    fn load_level(&mut self) -> PurseResult<Level>;
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for Box<A> {
    fn save(&mut self, amount: Amount, level: Level) -> PurseResult<()> {
        (**self).save(amount, level)
    }

    fn load_amount(&mut self) -> PurseResult<Amount> {
        (**self).load_amount()
    }

    fn load_level(&mut self) -> PurseResult<Level> {
        (**self).load_level()
    }
}

/// A purse's persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PurseSnapshot {
    pub amount: Amount,
    pub level:  Level,
}

impl PurseSnapshot {
    pub fn new(amount: Amount, level: Level) -> Self {
        Self { amount, level }
    }
}

/// Keeps state in memory and records every call.
/// Used in tests and by the runner when nothing should touch disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    pub state:       PurseSnapshot,
    /// Every snapshot passed to `save`, in call order.
    pub saves:       Vec<PurseSnapshot>,
    pub amount_loads: usize,
    pub level_loads:  usize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously stored amount and level.
    pub fn seeded(amount: Amount, level: Level) -> Self {
        Self {
            state: PurseSnapshot::new(amount, level),
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.len()
    }

    pub fn last_save(&self) -> Option<&PurseSnapshot> {
        self.saves.last()
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn save(&mut self, amount: Amount, level: Level) -> PurseResult<()> {
        let snapshot = PurseSnapshot::new(amount, level);
        self.state = snapshot;
        self.saves.push(snapshot);
        Ok(())
    }

    fn load_amount(&mut self) -> PurseResult<Amount> {
        self.amount_loads += 1;
        Ok(self.state.amount)
    }

    fn load_level(&mut self) -> PurseResult<Level> {
        self.level_loads += 1;
        Ok(self.state.level)
    }
}
