//! `quote`: prices a loan of `amount` against the configured oracle.

use crate::cli::ui;
use crate::config::AppConfig;
use crate::core::types::{Amount, AssetId};
use crate::fees::FeeCalculator;
use crate::providers::http::HttpPriceOracle;
use anyhow::Result;
use std::sync::Arc;

pub async fn run(config: &AppConfig, asset: &str, amount: Amount) -> Result<()> {
    let oracle = Arc::new(HttpPriceOracle::new(&config.oracle.base_url));
    let fees = FeeCalculator::new(oracle, config.fee_fraction_bps);

    let asset = AssetId::from(asset);
    let fee = fees.quote(&asset, amount).await?;

    println!(
        "Borrowing {} {} costs a fee of {} ({} bps on the reference value, priced now)",
        ui::style_text(&amount.to_string(), ui::StyleType::Label),
        asset,
        ui::style_text(&fee.to_string(), ui::StyleType::Value),
        config.fee_fraction_bps,
    );
    Ok(())
}
