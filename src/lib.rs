pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod fees;
pub mod ledger;
pub mod pool;
pub mod providers;
pub mod registry;
pub mod store;

pub use crate::core::error::PoolError;
pub use crate::core::types::{AccountId, Amount, AssetId, SCALE};
pub use crate::engine::{LoanPhase, SettlementPolicy};
pub use crate::pool::{AssetState, FlashPool, PoolSettings};
pub use crate::registry::AdminCap;
