//! Venue B: Uniswap V3 pool `slot0()` read over JSON-RPC

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::PriceSource;
use crate::error::{ArbitrageError, ArbitrageResult};
use crate::types::{PriceObservation, SqrtPriceEncoding, Venue};

/// `slot0()` function selector
pub const SLOT0_SELECTOR: &str = "0x3850c7bd";

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

pub struct UniswapV3PoolSource {
    client: Client,
    rpc_url: String,
    pool_address: String,
    encoding: SqrtPriceEncoding,
}

impl UniswapV3PoolSource {
    pub fn new(
        client: Client,
        rpc_url: impl Into<String>,
        pool_address: impl Into<String>,
        encoding: SqrtPriceEncoding,
    ) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            pool_address: pool_address.into(),
            encoding,
        }
    }

    pub fn pool_address(&self) -> &str {
        &self.pool_address
    }
}

#[async_trait]
impl PriceSource for UniswapV3PoolSource {
    fn name(&self) -> &str {
        "Uniswap V3"
    }

    fn venue(&self) -> Venue {
        Venue::B
    }

    async fn fetch_observation(&self) -> ArbitrageResult<PriceObservation> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{
                "to": self.pool_address,
                "data": SLOT0_SELECTOR
            }, "latest"],
            "id": 1
        });

        let response = self.client.post(&self.rpc_url).json(&payload).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ArbitrageError::RateLimited(self.name().to_string()));
        }
        if !status.is_success() {
            return Err(ArbitrageError::PriceFetch(format!("RPC returned {status}")));
        }

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ArbitrageError::PriceFetch(format!("invalid RPC response: {e}")))?;

        if let Some(err) = response.error {
            return Err(ArbitrageError::PriceFetch(format!("RPC error: {err}")));
        }

        let result = response
            .result
            .ok_or_else(|| ArbitrageError::PriceFetch("no result in RPC response".to_string()))?;

        let raw = decode_sqrt_price_word(&result)?;
        debug!(pool = %self.pool_address, sqrt_price_x96 = raw, "slot0 fetched");

        Ok(PriceObservation::sqrt_price_x96(Venue::B, raw, self.encoding))
    }
}

/// Extract `sqrtPriceX96` from ABI-encoded `slot0()` output.
///
/// The value is a uint160 in the first 32-byte word, so the top 12 bytes of
/// that word must be zero.
pub fn decode_sqrt_price_word(result: &str) -> ArbitrageResult<f64> {
    let bytes = hex::decode(result.trim_start_matches("0x"))
        .map_err(|e| ArbitrageError::PriceFetch(format!("failed to decode hex response: {e}")))?;

    if bytes.len() < 32 {
        return Err(ArbitrageError::PriceFetch(format!(
            "response too short: {} bytes",
            bytes.len()
        )));
    }

    if bytes[..12].iter().any(|b| *b != 0) {
        return Err(ArbitrageError::PriceFetch(
            "sqrtPriceX96 word exceeds 160 bits".to_string(),
        ));
    }

    Ok(bytes[12..32]
        .iter()
        .fold(0.0, |acc, b| acc * 256.0 + f64::from(*b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_POOL_ADDRESS;
    use crate::http::create_client;
    use crate::pricing::normalize;
    use mockito::Matcher;
    use rust_decimal::prelude::ToPrimitive;
    use std::time::Duration;

    const SQRT_PRICE_2000: u128 = 1_771_595_571_142_957_166_518_320_255_467_520;

    /// slot0() output: sqrtPriceX96 followed by six zeroed words
    fn slot0_result(sqrt_price: u128) -> String {
        format!("0x{:064x}{}", sqrt_price, "0".repeat(64 * 6))
    }

    fn source(url: String) -> UniswapV3PoolSource {
        let client = create_client(Duration::from_secs(2)).unwrap();
        UniswapV3PoolSource::new(
            client,
            url,
            DEFAULT_POOL_ADDRESS,
            SqrtPriceEncoding::new(18, 6, false),
        )
    }

    #[test]
    fn test_decode_word() {
        let raw = decode_sqrt_price_word(&slot0_result(SQRT_PRICE_2000)).unwrap();
        let expected = SQRT_PRICE_2000 as f64;
        assert!(((raw - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn test_decode_rejects_short_and_bad_hex() {
        assert!(decode_sqrt_price_word("0x1234").is_err());
        assert!(decode_sqrt_price_word("0xzz").is_err());

        let oversized = format!("0x{}", "f".repeat(64));
        assert!(decode_sqrt_price_word(&oversized).is_err());
    }

    #[tokio::test]
    async fn test_fetch_slot0() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": slot0_result(SQRT_PRICE_2000),
        });
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "method": "eth_call",
                "params": [{ "to": DEFAULT_POOL_ADDRESS, "data": SLOT0_SELECTOR }, "latest"],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let observation = source(server.url()).fetch_observation().await.unwrap();
        assert_eq!(observation.venue, Venue::B);
        mock.assert_async().await;

        let price = normalize(&observation).unwrap().usd_price.to_f64().unwrap();
        assert!((price - 2000.0).abs() < 2.0, "decoded {price}");
    }

    #[tokio::test]
    async fn test_rpc_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create_async()
            .await;

        let err = source(server.url()).fetch_observation().await.unwrap_err();
        assert!(matches!(err, ArbitrageError::PriceFetch(_)));
        assert!(err.to_string().contains("execution reverted"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(429)
            .create_async()
            .await;

        let err = source(server.url()).fetch_observation().await.unwrap_err();
        assert!(matches!(err, ArbitrageError::RateLimited(_)));
    }
}
