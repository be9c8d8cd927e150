//! Venue A: CoinGecko simple price feed

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use tracing::debug;

use super::PriceSource;
use crate::error::{ArbitrageError, ArbitrageResult};
use crate::types::{PriceObservation, Venue};

/// `{ "<asset>": { "<currency>": price } }`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoSource {
    client: Client,
    base_url: String,
    asset_id: String,
    vs_currency: String,
}

impl CoinGeckoSource {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        asset_id: impl Into<String>,
        vs_currency: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            asset_id: asset_id.into(),
            vs_currency: vs_currency.into(),
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn venue(&self) -> Venue {
        Venue::A
    }

    async fn fetch_observation(&self) -> ArbitrageResult<PriceObservation> {
        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", self.asset_id.as_str()),
                ("vs_currencies", self.vs_currency.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ArbitrageError::RateLimited(self.name().to_string()));
        }
        if !status.is_success() {
            return Err(ArbitrageError::PriceFetch(format!(
                "CoinGecko returned {status}"
            )));
        }

        let body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| ArbitrageError::PriceFetch(format!("invalid CoinGecko response: {e}")))?;

        let price = body
            .get(&self.asset_id)
            .and_then(|quotes| quotes.get(&self.vs_currency))
            .copied()
            .ok_or_else(|| {
                ArbitrageError::PriceFetch(format!(
                    "CoinGecko has no {} price for {}",
                    self.vs_currency, self.asset_id
                ))
            })?;

        debug!(asset = %self.asset_id, price, "CoinGecko price fetched");
        Ok(PriceObservation::decimal_usd(Venue::A, price))
    }
}
