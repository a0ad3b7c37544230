//! Static price table oracle
//!
//! Serves operator-configured prices. Useful for simulations and for assets
//! pegged 1:1 to the reference unit; tests also use it to script price
//! trajectories between quotes.

use crate::core::oracle::PriceOracle;
use crate::core::types::AssetId;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FixedPriceOracle {
    prices: Mutex<HashMap<AssetId, u128>>,
}

impl FixedPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, asset: AssetId, price: u128) {
        self.prices.lock().unwrap().insert(asset, price);
    }
}

#[async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn price_of(&self, asset: &AssetId) -> Result<u128> {
        self.prices
            .lock()
            .unwrap()
            .get(asset)
            .copied()
            .ok_or_else(|| anyhow!("no price configured for {asset}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SCALE;

    #[tokio::test]
    async fn test_configured_price_is_served() {
        let oracle = FixedPriceOracle::new();
        oracle.set_price(AssetId::from("USDX"), SCALE);
        assert_eq!(oracle.price_of(&AssetId::from("USDX")).await.unwrap(), SCALE);
    }

    #[tokio::test]
    async fn test_unknown_asset_errors() {
        let oracle = FixedPriceOracle::new();
        let err = oracle.price_of(&AssetId::from("USDX")).await.unwrap_err();
        assert!(err.to_string().contains("no price configured"));
    }

    #[tokio::test]
    async fn test_price_can_be_moved() {
        let oracle = FixedPriceOracle::new();
        let asset = AssetId::from("USDX");
        oracle.set_price(asset.clone(), SCALE);
        oracle.set_price(asset.clone(), SCALE / 2);
        assert_eq!(oracle.price_of(&asset).await.unwrap(), SCALE / 2);
    }
}
