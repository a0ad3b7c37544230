//! Constant-product backing-pair oracle
//!
//! Prices an asset off the reserve ratio of a simulated automated-market-maker
//! pair against the reference unit. Swapping against the pair moves the spot
//! price, which is exactly the manipulation surface the protocol inherits from
//! reading such an oracle live; adversarial tests lean on this.

use crate::core::oracle::PriceOracle;
use crate::core::types::{AssetId, SCALE};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct PairReserves {
    asset: u128,
    reference: u128,
}

#[derive(Default)]
pub struct AmmPriceOracle {
    pairs: Mutex<HashMap<AssetId, PairReserves>>,
}

impl AmmPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pair(&self, asset: AssetId, asset_reserve: u128, reference_reserve: u128) {
        self.pairs.lock().unwrap().insert(
            asset,
            PairReserves {
                asset: asset_reserve,
                reference: reference_reserve,
            },
        );
    }

    /// Sells `amount_in` of the asset into the pair, x·y = k. Returns the
    /// reference amount paid out; the asset's spot price drops.
    pub fn swap_asset_in(&self, asset: &AssetId, amount_in: u128) -> Result<u128> {
        let mut pairs = self.pairs.lock().unwrap();
        let reserves = pairs
            .get_mut(asset)
            .ok_or_else(|| anyhow!("no backing pair for {asset}"))?;
        if amount_in == 0 {
            bail!("swap amount must be greater than zero");
        }

        let k = reserves
            .asset
            .checked_mul(reserves.reference)
            .ok_or_else(|| anyhow!("pair reserves overflow"))?;
        let new_asset = reserves
            .asset
            .checked_add(amount_in)
            .ok_or_else(|| anyhow!("pair reserves overflow"))?;
        let new_reference = k / new_asset;
        let out = reserves.reference - new_reference;

        reserves.asset = new_asset;
        reserves.reference = new_reference;
        debug!(asset = %asset, amount_in, out, "swap against backing pair");
        Ok(out)
    }

    /// Buys the asset out of the pair with `amount_in` reference units; the
    /// asset's spot price rises.
    pub fn swap_reference_in(&self, asset: &AssetId, amount_in: u128) -> Result<u128> {
        let mut pairs = self.pairs.lock().unwrap();
        let reserves = pairs
            .get_mut(asset)
            .ok_or_else(|| anyhow!("no backing pair for {asset}"))?;
        if amount_in == 0 {
            bail!("swap amount must be greater than zero");
        }

        let k = reserves
            .asset
            .checked_mul(reserves.reference)
            .ok_or_else(|| anyhow!("pair reserves overflow"))?;
        let new_reference = reserves
            .reference
            .checked_add(amount_in)
            .ok_or_else(|| anyhow!("pair reserves overflow"))?;
        let new_asset = k / new_reference;
        let out = reserves.asset - new_asset;

        reserves.asset = new_asset;
        reserves.reference = new_reference;
        debug!(asset = %asset, amount_in, out, "swap against backing pair");
        Ok(out)
    }
}

#[async_trait]
impl PriceOracle for AmmPriceOracle {
    async fn price_of(&self, asset: &AssetId) -> Result<u128> {
        let pairs = self.pairs.lock().unwrap();
        let reserves = pairs
            .get(asset)
            .ok_or_else(|| anyhow!("no backing pair for {asset}"))?;
        reserves
            .reference
            .checked_mul(SCALE)
            .map(|scaled| scaled / reserves.asset)
            .ok_or_else(|| anyhow!("pair reserves overflow"))
    }
}
