//! HTTP price oracle
//!
//! Queries a JSON endpoint (`GET {base_url}/price/{asset}`) answering
//! `{"price": "1.0025"}`. Prices are parsed as decimals and converted exactly
//! into the protocol's fixed point; float rounding never touches monetary
//! math. Requests are retried a few times before the oracle is reported
//! unavailable.

use crate::core::oracle::PriceOracle;
use crate::core::types::{AssetId, SCALE};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpPriceOracle {
    base_url: String,
}

impl HttpPriceOracle {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Decimal,
}

/// Converts a decimal reference price into SCALE fixed point, truncating
/// sub-precision digits.
fn to_fixed_point(price: Decimal) -> Result<u128> {
    if price.is_sign_negative() {
        bail!("negative price {price}");
    }
    price
        .checked_mul(Decimal::from(SCALE as u64))
        .and_then(|scaled| scaled.trunc().to_u128())
        .ok_or_else(|| anyhow!("price {price} out of range"))
}

async fn send_with_retry(
    client: &reqwest::Client,
    url: &str,
    retries: usize,
    delay_ms: u64,
) -> Result<reqwest::Response> {
    let mut attempt = 1;
    loop {
        match client.get(url).send().await {
            Ok(response) => return Ok(response),
            Err(err) => {
                if attempt > retries {
                    return Err(err.into());
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn price_of(&self, asset: &AssetId) -> Result<u128> {
        let url = format!("{}/price/{}", self.base_url, asset);
        debug!("Requesting price from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("flashpool/0.2")
            .build()?;
        let response = send_with_retry(&client, &url, 3, 500)
            .await
            .with_context(|| format!("Failed to send price request for asset: {asset}"))?;

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get price response text for asset: {asset}"))?;

        if response_text.trim().is_empty() {
            bail!("Received empty price response for asset: {asset}");
        }

        let parsed: PriceResponse = serde_json::from_str(&response_text).with_context(|| {
            format!("Failed to parse price response for asset: {asset}. Response: '{response_text}'")
        })?;

        let price = to_fixed_point(parsed.price)
            .with_context(|| format!("Unusable price for asset: {asset}"))?;
        debug!("Successfully fetched price for {}: {}", asset, price);
        Ok(price)
    }
}
