//! The currency purse: an amount, its level, and the tick-save counter.
//!
//! STATE MACHINE: Uninitialized -> Initialized, one way, via `init`.
//! Every read and every transaction fails with `PurseError::Uninitialized`
//! until an adapter has been injected and loaded from.
//!
//! TRANSACTION ORDER (add and subtract):
//!   1. Reject if uninitialized or the value is not a finite, non-negative number.
//!   2. Convert the value into the purse's current level per `ScalingPolicy`.
//!   3. Reject if the new balance would not be finite; nothing changes.
//!   4. Apply it, then carry (up after add, down after subtract).
//!   5. Count one tick; save through the adapter when the threshold is hit.

use crate::{
    adapter::{PersistenceAdapter, PurseSnapshot},
    config::{PurseConfig, ScalingPolicy},
    error::{PurseError, PurseResult},
    level::Level,
    types::{Amount, LEVEL_SCALE},
};
use std::fmt;

pub struct CurrencyPurse<A: PersistenceAdapter> {
    amount:           Amount,
    level:            Level,
    config:           PurseConfig,
    ticks_since_save: u32,
    adapter:          Option<A>,
}

impl<A: PersistenceAdapter> CurrencyPurse<A> {
    /// Create a purse and immediately load its state from `adapter`.
    pub fn new(adapter: A, config: PurseConfig) -> PurseResult<Self> {
        let mut purse = Self::uninitialized(config);
        purse.init(adapter)?;
        Ok(purse)
    }

    /// A purse with no adapter yet. Unusable until `init` runs.
    pub fn uninitialized(config: PurseConfig) -> Self {
        Self {
            amount: 0.0,
            level: Level::MIN,
            config,
            ticks_since_save: 0,
            adapter: None,
        }
    }

    /// Inject the adapter and load amount and level from it.
    ///
    /// Runs once. Later calls are ignored and drop the adapter passed in.
    /// If loading fails the purse stays uninitialized.
    pub fn init(&mut self, mut adapter: A) -> PurseResult<()> {
        if self.is_initialized() {
            log::warn!("purse: init called on an initialized purse, ignoring");
            return Ok(());
        }

        let amount = adapter.load_amount()?;
        let level = adapter.load_level()?;
        if !amount.is_finite() {
            return Err(PurseError::InvalidAmount { value: amount });
        }

        self.amount = amount;
        self.level = level;
        self.ticks_since_save = 0;
        self.adapter = Some(adapter);

        log::debug!("purse: initialized at {amount}{}", level.suffix());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn amount(&self) -> PurseResult<Amount> {
        self.ensure_initialized()?;
        Ok(self.amount)
    }

    pub fn level(&self) -> PurseResult<Level> {
        self.ensure_initialized()?;
        Ok(self.level)
    }

    pub fn snapshot(&self) -> PurseResult<PurseSnapshot> {
        self.ensure_initialized()?;
        Ok(PurseSnapshot::new(self.amount, self.level))
    }

    /// The balance expressed in base units (`Level::Units`).
    pub fn total(&self) -> PurseResult<Amount> {
        self.ensure_initialized()?;
        Ok(self.amount * LEVEL_SCALE.powi(self.level.ordinal()))
    }

    /// Whether subtracting `value` at `value_level` keeps the balance non-negative.
    pub fn can_afford(&self, value: Amount, value_level: Level) -> PurseResult<bool> {
        self.check_transaction(value)?;
        let distance = self.level.distance_to(value_level);
        Ok(self.amount - self.subtract_delta(value, distance) >= 0.0)
    }

    pub fn add(&mut self, value: Amount, value_level: Level) -> PurseResult<()> {
        self.check_transaction(value)?;

        let distance = self.level.distance_to(value_level);
        self.amount = finite_balance(self.amount + self.add_delta(value, distance), value)?;
        self.carry_up();

        self.tick_save()
    }

    pub fn subtract(&mut self, value: Amount, value_level: Level) -> PurseResult<()> {
        self.check_transaction(value)?;

        let distance = self.level.distance_to(value_level);
        self.amount = finite_balance(self.amount - self.subtract_delta(value, distance), value)?;
        self.carry_down();

        self.tick_save()
    }

    /// Save now, whatever the tick counter says, and reset it.
    pub fn force_save(&mut self) -> PurseResult<()> {
        let (amount, level) = (self.amount, self.level);
        self.adapter_mut()?.save(amount, level)?;
        self.ticks_since_save = 0;
        log::debug!("purse: forced save at {amount}{}", level.suffix());
        Ok(())
    }

    /// Flush any unsaved ticks and hand the adapter back.
    pub fn close(mut self) -> PurseResult<A> {
        if self.ticks_since_save > 0 {
            self.force_save()?;
        }
        self.adapter.take().ok_or(PurseError::Uninitialized)
    }

    pub fn save_ticks(&self) -> u32 {
        self.config.save_ticks
    }

    pub fn set_save_ticks(&mut self, save_ticks: u32) {
        self.config.save_ticks = save_ticks;
    }

    /// Transactions counted since the last save.
    pub fn pending_ticks(&self) -> u32 {
        self.ticks_since_save
    }

    pub fn scaling(&self) -> ScalingPolicy {
        self.config.scaling
    }

    /// Borrow the injected adapter. For tests and tooling.
    pub fn adapter(&self) -> Option<&A> {
        self.adapter.as_ref()
    }

    fn ensure_initialized(&self) -> PurseResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(PurseError::Uninitialized)
        }
    }

    fn check_transaction(&self, value: Amount) -> PurseResult<()> {
        self.ensure_initialized()?;
        if !value.is_finite() || value < 0.0 {
            return Err(PurseError::InvalidAmount { value });
        }
        Ok(())
    }

    fn adapter_mut(&mut self) -> PurseResult<&mut A> {
        self.adapter.as_mut().ok_or(PurseError::Uninitialized)
    }

    /// `value` converted into the current level's units, to be added.
    fn add_delta(&self, value: Amount, distance: i32) -> Amount {
        match self.config.scaling {
            ScalingPolicy::Exponential => value * LEVEL_SCALE.powi(distance),
            ScalingPolicy::Legacy => match distance {
                0 => value,
                -1 => value / LEVEL_SCALE,
                d if d > 0 => value * (LEVEL_SCALE * d as Amount),
                _ => 0.0,
            },
        }
    }

    /// `value` converted into the current level's units, to be subtracted.
    fn subtract_delta(&self, value: Amount, distance: i32) -> Amount {
        match self.config.scaling {
            ScalingPolicy::Exponential => value * LEVEL_SCALE.powi(distance),
            ScalingPolicy::Legacy => match distance {
                0 => value,
                d => {
                    let factor = LEVEL_SCALE * d as Amount;
                    if d < 0 { value / factor } else { value * factor }
                }
            },
        }
    }

    fn carry_up(&mut self) {
        while self.amount > LEVEL_SCALE {
            let Some(next) = self.level.up() else { break };
            self.level = next;
            self.amount /= LEVEL_SCALE;
            log::debug!("purse: carried up to {}", next);
        }
    }

    fn carry_down(&mut self) {
        while self.amount > 0.0 && self.amount < 1.0 {
            let Some(next) = self.level.down() else { break };
            self.level = next;
            self.amount *= LEVEL_SCALE;
            log::debug!("purse: carried down to {}", next);
        }
    }

    /// Count one transaction and save when the threshold is reached.
    /// A threshold of 0 saves on every transaction.
    /// A failed save leaves the tick counted, so every later transaction
    /// tries again and `pending_ticks` keeps growing until one succeeds.
    fn tick_save(&mut self) -> PurseResult<()> {
        self.ticks_since_save += 1;
        if self.ticks_since_save < self.config.save_ticks.max(1) {
            return Ok(());
        }

        let (amount, level) = (self.amount, self.level);
        self.adapter_mut()?.save(amount, level)?;
        self.ticks_since_save = 0;
        log::debug!("purse: saved at {amount}{}", level.suffix());
        Ok(())
    }
}

/// `balance` if it is finite, else the transaction that produced it is rejected.
fn finite_balance(balance: Amount, value: Amount) -> PurseResult<Amount> {
    if balance.is_finite() {
        Ok(balance)
    } else {
        Err(PurseError::InvalidAmount { value })
    }
}

impl<A: PersistenceAdapter> fmt::Display for CurrencyPurse<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_initialized() {
            return f.write_str("<uninitialized>");
        }
        write!(f, "{:.2}{}", self.amount, self.level.suffix())
    }
}

impl<A: PersistenceAdapter> fmt::Debug for CurrencyPurse<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyPurse")
            .field("amount", &self.amount)
            .field("level", &self.level)
            .field("config", &self.config)
            .field("ticks_since_save", &self.ticks_since_save)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
