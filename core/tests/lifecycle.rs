//! Uninitialized -> Initialized: the purse's only state transition.

use purse_core::{
    CurrencyPurse, Level, MemoryAdapter, PersistenceAdapter, PurseConfig, PurseError,
    PurseResult, PurseSnapshot,
};

fn uninit() -> CurrencyPurse<MemoryAdapter> {
    CurrencyPurse::uninitialized(PurseConfig::default())
}

#[test]
fn accessors_fail_before_init() {
    let purse = uninit();
    assert!(!purse.is_initialized());
    assert!(matches!(purse.amount(), Err(PurseError::Uninitialized)));
    assert!(matches!(purse.level(), Err(PurseError::Uninitialized)));
    assert!(matches!(purse.snapshot(), Err(PurseError::Uninitialized)));
    assert!(matches!(purse.total(), Err(PurseError::Uninitialized)));
    assert_eq!(purse.to_string(), "<uninitialized>");
}

#[test]
fn transactions_fail_before_init() {
    let mut purse = uninit();
    assert!(matches!(purse.add(10.0, Level::Units), Err(PurseError::Uninitialized)));
    assert!(matches!(purse.subtract(10.0, Level::Units), Err(PurseError::Uninitialized)));
    assert!(matches!(purse.force_save(), Err(PurseError::Uninitialized)));
    assert!(matches!(purse.can_afford(1.0, Level::Units), Err(PurseError::Uninitialized)));
    assert_eq!(purse.pending_ticks(), 0);
}

#[test]
fn close_fails_before_init() {
    assert!(matches!(uninit().close(), Err(PurseError::Uninitialized)));
}

#[test]
fn init_loads_seeded_state() {
    let mut purse = uninit();
    purse.init(MemoryAdapter::seeded(12.0, Level::T)).unwrap();

    assert!(purse.is_initialized());
    assert_eq!(purse.amount().unwrap(), 12.0);
    assert_eq!(purse.level().unwrap(), Level::T);
}

#[test]
fn constructor_initializes_immediately() {
    let purse = CurrencyPurse::new(MemoryAdapter::seeded(3.0, Level::K), PurseConfig::default())
        .unwrap();
    assert!(purse.is_initialized());
    assert_eq!(purse.level().unwrap(), Level::K);

    let adapter = purse.adapter().unwrap();
    assert_eq!(adapter.amount_loads, 1);
    assert_eq!(adapter.level_loads, 1);
}

#[test]
fn second_init_does_not_reload() {
    let mut purse = CurrencyPurse::new(MemoryAdapter::seeded(3.0, Level::K), PurseConfig::default())
        .unwrap();

    purse.init(MemoryAdapter::seeded(999.0, Level::QQ)).unwrap();

    assert_eq!(purse.amount().unwrap(), 3.0);
    assert_eq!(purse.level().unwrap(), Level::K);

    let adapter = purse.adapter().unwrap();
    assert_eq!(adapter.amount_loads, 1);
    assert_eq!(adapter.level_loads, 1);
}

struct BrokenLoad;

impl PersistenceAdapter for BrokenLoad {
    fn save(&mut self, _amount: f64, _level: Level) -> PurseResult<()> {
        Ok(())
    }

    fn load_amount(&mut self) -> PurseResult<f64> {
        Ok(1.0)
    }

    fn load_level(&mut self) -> PurseResult<Level> {
        Err(PurseError::InvalidLevel(99))
    }
}

#[test]
fn failed_load_leaves_purse_uninitialized() {
    let mut purse: CurrencyPurse<Box<dyn PersistenceAdapter>> =
        CurrencyPurse::uninitialized(PurseConfig::default());

    let err = purse.init(Box::new(BrokenLoad)).unwrap_err();
    assert!(matches!(err, PurseError::InvalidLevel(99)));
    assert!(!purse.is_initialized());

    // A later init with a working adapter still goes through.
    purse.init(Box::new(MemoryAdapter::seeded(4.0, Level::M))).unwrap();
    assert_eq!(purse.amount().unwrap(), 4.0);
    assert_eq!(purse.level().unwrap(), Level::M);
}

#[test]
fn boxed_adapters_are_accepted() {
    let adapter: Box<dyn PersistenceAdapter> = Box::new(MemoryAdapter::new());
    let mut purse = CurrencyPurse::new(adapter, PurseConfig::default()).unwrap();
    purse.add(2.0, Level::K).unwrap();
    assert_eq!(purse.snapshot().unwrap(), PurseSnapshot::new(2.0, Level::K));

    // Exactly one thousand units stays at the base level.
    let adapter: Box<dyn PersistenceAdapter> = Box::new(MemoryAdapter::new());
    let mut purse = CurrencyPurse::new(adapter, PurseConfig::default()).unwrap();
    purse.add(1.0, Level::K).unwrap();
    assert_eq!(purse.snapshot().unwrap(), PurseSnapshot::new(1000.0, Level::Units));
}

#[test]
fn non_finite_stored_amount_fails_init() {
    let mut purse = uninit();
    let err = purse.init(MemoryAdapter::seeded(f64::INFINITY, Level::QQ)).unwrap_err();
    assert!(matches!(err, PurseError::InvalidAmount { .. }), "unexpected error: {err:?}");
    assert!(!purse.is_initialized());
}

#[test]
fn error_messages_are_readable() {
    assert_eq!(PurseError::Uninitialized.to_string(), "Currency purse is not initialized");
    assert_eq!(
        PurseError::InvalidAmount { value: -2.0 }.to_string(),
        "Invalid transaction amount: -2"
    );
}
