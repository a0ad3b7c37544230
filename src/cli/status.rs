//! `status`: renders the persisted per-asset audit records, annotated with a
//! best-effort live oracle price.

use crate::cli::ui;
use crate::config::AppConfig;
use crate::core::oracle::PriceOracle;
use crate::providers::http::HttpPriceOracle;
use crate::store::{FjallStore, StateStore};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;

pub async fn run(config: &AppConfig) -> Result<()> {
    let store = FjallStore::open(&AppConfig::default_data_path()?.join("state"))?;
    let states = store.list()?;
    if states.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No persisted pool state yet. Run `flashpool simulate` or attach a pool to this store.",
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    let oracle = HttpPriceOracle::new(&config.oracle.base_url);
    let bar = ui::new_progress_bar(states.len() as u64);
    let prices = join_all(states.iter().map(|state| {
        let oracle = &oracle;
        let bar = &bar;
        async move {
            let price = oracle.price_of(&state.asset).await.ok();
            bar.inc(1);
            price
        }
    }))
    .await;
    bar.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Enabled"),
        ui::header_cell("Total Shares"),
        ui::header_cell("Exchange Rate"),
        ui::header_cell("Held Balance"),
        ui::header_cell("Oracle Price"),
        ui::header_cell("Updated (UTC)"),
    ]);
    for (state, price) in states.iter().zip(prices) {
        table.add_row(vec![
            Cell::new(state.asset.to_string()),
            Cell::new(if state.enabled { "yes" } else { "no" }),
            ui::amount_cell(state.total_shares),
            Cell::new(ui::fixed_point(state.exchange_rate))
                .set_alignment(comfy_table::CellAlignment::Right),
            ui::amount_cell(state.held_balance),
            ui::format_optional_cell(price, ui::fixed_point),
            Cell::new(state.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    println!("{}\n", ui::style_text("Pool state", ui::StyleType::Title));
    println!("{table}");
    Ok(())
}
