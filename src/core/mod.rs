//! Trait seams and shared primitives

pub mod error;
pub mod log;
pub mod oracle;
pub mod receiver;
pub mod token;
pub mod types;

// Re-export main types for cleaner imports
pub use error::PoolError;
pub use oracle::PriceOracle;
pub use receiver::FlashBorrower;
pub use token::{FungibleToken, TokenSnapshot};
pub use types::{AccountId, Amount, AssetId, BPS_DENOMINATOR, SCALE};
