//! Protocol error taxonomy
//!
//! Every failure of a pool operation surfaces as one of these variants; none
//! are recovered internally. Collaborator traits (`PriceOracle`,
//! `FungibleToken`, `FlashBorrower`) report `anyhow::Error` at the seam and
//! are mapped into the taxonomy at the operation boundary.

use crate::core::types::{Amount, AssetId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),

    #[error("asset {0} is disabled")]
    AssetDisabled(AssetId),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient liquidity in {asset}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        asset: AssetId,
        requested: Amount,
        available: Amount,
    },

    #[error("insufficient shares of {asset}: requested {requested}, held {held}")]
    InsufficientShares {
        asset: AssetId,
        requested: Amount,
        held: Amount,
    },

    #[error("exchange rate would not increase: {old_rate} -> {new_rate}")]
    ExchangeRateRegression { old_rate: u128, new_rate: u128 },

    #[error("cannot realize a fee against an empty share supply for {0}")]
    ZeroShareSupply(AssetId),

    #[error("settlement check failed for {asset}: required {required}, observed {observed}")]
    SettlementFailed {
        asset: AssetId,
        required: Amount,
        observed: Amount,
    },

    #[error("receiver callback rejected the loan: {0}")]
    CallbackRejected(String),

    #[error("price oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("reentrant operation on {0}")]
    Reentrant(AssetId),

    #[error("no active loan on {0}")]
    NoActiveLoan(AssetId),

    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    #[error("token operation failed: {0}")]
    Token(String),
}

impl PoolError {
    /// Wraps a collaborator-token failure, keeping the full error chain text.
    pub fn token(err: anyhow::Error) -> Self {
        PoolError::Token(format!("{err:#}"))
    }
}
