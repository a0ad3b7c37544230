//! Loan fee calculation
//!
//! Converts a requested loan amount into a fee in asset units: a fixed
//! protocol fraction applied to the reference value of the loan, priced
//! through the oracle. Quotes are pure and read the price at call time —
//! a quote is never cached across a loan lifecycle, because the price can
//! move between the quote and the settlement check.

use crate::core::error::PoolError;
use crate::core::oracle::PriceOracle;
use crate::core::types::{Amount, AssetId, BPS_DENOMINATOR, SCALE};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct FeeCalculator {
    oracle: Arc<dyn PriceOracle>,
    fee_fraction_bps: u32,
}

impl FeeCalculator {
    pub fn new(oracle: Arc<dyn PriceOracle>, fee_fraction_bps: u32) -> Self {
        Self {
            oracle,
            fee_fraction_bps,
        }
    }

    pub fn fee_fraction_bps(&self) -> u32 {
        self.fee_fraction_bps
    }

    /// Quotes the fee, in asset units, for borrowing `amount`.
    pub async fn quote(&self, asset: &AssetId, amount: Amount) -> Result<Amount, PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let price = self
            .oracle
            .price_of(asset)
            .await
            .map_err(|e| PoolError::OracleUnavailable(format!("{e:#}")))?;

        let reference_value = amount
            .checked_mul(price)
            .ok_or(PoolError::AmountOverflow)?
            / SCALE;
        let fee = reference_value
            .checked_mul(self.fee_fraction_bps as u128)
            .ok_or(PoolError::AmountOverflow)?
            / BPS_DENOMINATOR;

        debug!(asset = %asset, amount, price, fee, "quoted loan fee");
        Ok(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fixed::FixedPriceOracle;

    fn calculator(oracle: Arc<FixedPriceOracle>, bps: u32) -> FeeCalculator {
        FeeCalculator::new(oracle, bps)
    }

    #[tokio::test]
    async fn test_fee_at_unit_price() {
        let oracle = Arc::new(FixedPriceOracle::new());
        oracle.set_price(AssetId::from("USDX"), SCALE);

        let fees = calculator(Arc::clone(&oracle), 30);
        let fee = fees.quote(&AssetId::from("USDX"), 1_000).await.unwrap();
        assert_eq!(fee, 3);
    }

    #[tokio::test]
    async fn test_fee_scales_with_price() {
        let oracle = Arc::new(FixedPriceOracle::new());
        oracle.set_price(AssetId::from("WBTX"), 2 * SCALE);

        let fees = calculator(Arc::clone(&oracle), 30);
        let fee = fees.quote(&AssetId::from("WBTX"), 1_000).await.unwrap();
        assert_eq!(fee, 6);
    }

    #[tokio::test]
    async fn test_price_is_read_fresh_on_every_quote() {
        let asset = AssetId::from("USDX");
        let oracle = Arc::new(FixedPriceOracle::new());
        oracle.set_price(asset.clone(), SCALE);
        let fees = calculator(Arc::clone(&oracle), 30);

        let first = fees.quote(&asset, 1_000).await.unwrap();
        oracle.set_price(asset.clone(), SCALE / 2);
        let second = fees.quote(&asset, 1_000).await.unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 1);
        assert!(second < first);
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected_before_the_oracle_call() {
        let oracle = Arc::new(FixedPriceOracle::new());
        let fees = calculator(oracle, 30);

        let err = fees.quote(&AssetId::from("USDX"), 0).await.unwrap_err();
        assert!(matches!(err, PoolError::ZeroAmount));
    }

    #[tokio::test]
    async fn test_missing_price_surfaces_as_oracle_unavailable() {
        let oracle = Arc::new(FixedPriceOracle::new());
        let fees = calculator(oracle, 30);

        let err = fees.quote(&AssetId::from("USDX"), 1_000).await.unwrap_err();
        assert!(matches!(err, PoolError::OracleUnavailable(_)));
    }
}
