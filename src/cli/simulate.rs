//! `simulate`: dry-runs the accounting engine against an in-process token.
//!
//! Deposits liquidity, runs one flash loan through the configured settlement
//! policy and shows the resulting exchange-rate move. State is persisted to
//! the default store so `flashpool status` can inspect it afterwards.

use crate::cli::ui;
use crate::config::{AppConfig, AssetConfig};
use crate::core::types::{AccountId, AssetId, SCALE};
use crate::engine::SettlementPolicy;
use crate::pool::{AssetState, FlashPool, PoolSettings};
use crate::providers::fixed::FixedPriceOracle;
use crate::providers::memory_token::InMemoryToken;
use crate::providers::receivers::{RepayMode, RepayingReceiver};
use crate::store::{FjallStore, StateStore};
use anyhow::{Context, Result, bail};
use comfy_table::Cell;
use std::sync::Arc;
use tracing::info;

const DEPOSIT: u128 = 10_000;
const LOAN: u128 = 1_000;

pub async fn run(config: &AppConfig) -> Result<()> {
    let oracle = Arc::new(FixedPriceOracle::new());
    let token = Arc::new(InMemoryToken::new());
    let store = FjallStore::open(&AppConfig::default_data_path()?.join("state"))
        .context("Failed to open the state store")?;

    let settings = PoolSettings::from_config(config);
    let (pool, admin) = FlashPool::new(
        settings,
        oracle.clone() as Arc<dyn crate::core::oracle::PriceOracle>,
        Some(Arc::new(store) as Arc<dyn StateStore>),
    );
    let pool = Arc::new(pool);

    let assets = if config.assets.is_empty() {
        vec![AssetConfig {
            id: "DEMO".to_string(),
            enabled: true,
        }]
    } else {
        config.assets.clone()
    };
    for asset_config in &assets {
        let asset = AssetId::from(asset_config.id.as_str());
        oracle.set_price(asset.clone(), SCALE);
        pool.set_asset(
            &admin,
            asset,
            token.clone() as Arc<dyn crate::core::token::FungibleToken>,
            asset_config.enabled,
        )
        .await?;
    }
    let Some(target) = assets.iter().find(|a| a.enabled) else {
        bail!("No enabled asset to simulate against");
    };
    let asset = AssetId::from(target.id.as_str());

    let provider = AccountId::from("liquidity-provider");
    let borrower = AccountId::from("borrower");
    token.mint(&provider, DEPOSIT * 10);
    token.mint(&borrower, LOAN);

    let shares = pool.deposit(&asset, &provider, DEPOSIT).await?;
    info!(asset = %asset, shares, "simulated deposit");
    let before = pool.asset_state(&asset).await?;

    let mode = match pool.settlement_policy() {
        SettlementPolicy::BalanceDelta => RepayMode::RawTransfer,
        SettlementPolicy::RepaymentLedger => RepayMode::RepayPath,
    };
    let receiver = RepayingReceiver::new(
        Arc::clone(&pool),
        token.clone() as Arc<dyn crate::core::token::FungibleToken>,
        borrower.clone(),
        mode,
    );
    let fee = pool.flashloan(&asset, &receiver, LOAN, &borrower, &[]).await?;
    let after = pool.asset_state(&asset).await?;

    render(&asset, fee, &before, &after);
    Ok(())
}

fn render(asset: &AssetId, fee: u128, before: &AssetState, after: &AssetState) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Before Loan"),
        ui::header_cell("After Loan"),
    ]);
    table.add_row(vec![
        Cell::new("Total shares"),
        ui::amount_cell(before.total_shares),
        ui::amount_cell(after.total_shares),
    ]);
    table.add_row(vec![
        Cell::new("Exchange rate"),
        Cell::new(ui::fixed_point(before.exchange_rate)),
        Cell::new(ui::fixed_point(after.exchange_rate)),
    ]);
    table.add_row(vec![
        Cell::new("Held balance"),
        ui::amount_cell(before.held_balance),
        ui::amount_cell(after.held_balance),
    ]);

    println!(
        "{}\n",
        ui::style_text(
            &format!("Flash loan simulation: {LOAN} {asset} borrowed against {DEPOSIT} deposited"),
            ui::StyleType::Title
        )
    );
    println!("{table}");
    println!(
        "\nCollected fee: {}",
        ui::style_text(&fee.to_string(), ui::StyleType::Value)
    );
}
