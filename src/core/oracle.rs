//! Price oracle abstraction
//!
//! The pool only ever consumes this interface; pricing math lives upstream.
//! Oracle output is treated as adversarial input — it is read fresh on every
//! quote and never range-checked here.

use crate::core::types::AssetId;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Reference-unit price of one unit of `asset`, fixed-point scaled by
    /// [`SCALE`](crate::core::types::SCALE).
    async fn price_of(&self, asset: &AssetId) -> Result<u128>;
}
