//! Currency purse: a float amount paired with an order-of-magnitude level,
//! persisted through an injected adapter every N transactions.

pub mod adapter;
pub mod config;
pub mod error;
pub mod file_store;
pub mod level;
pub mod purse;
pub mod store;
pub mod types;

pub use adapter::{MemoryAdapter, PersistenceAdapter, PurseSnapshot};
pub use config::{PurseConfig, ScalingPolicy};
pub use error::{PurseError, PurseResult};
pub use level::Level;
pub use purse::CurrencyPurse;
