//! Price Source Adapters
//!
//! Each venue is reached through a [`PriceSource`]. Adapters own retries and
//! transport concerns; a failed fetch simply means no observation this cycle.

use async_trait::async_trait;

use crate::error::ArbitrageResult;
use crate::types::{PriceObservation, Venue};

#[cfg(feature = "http")]
pub mod coingecko;
#[cfg(feature = "http")]
pub mod uniswap_v3;

#[cfg(feature = "http")]
pub use coingecko::CoinGeckoSource;
#[cfg(feature = "http")]
pub use uniswap_v3::UniswapV3PoolSource;

/// Trait implemented by all venue adapters
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable adapter name, used in logs
    fn name(&self) -> &str;

    /// Venue whose price this adapter reports
    fn venue(&self) -> Venue;

    /// Fetch a fresh raw observation
    async fn fetch_observation(&self) -> ArbitrageResult<PriceObservation>;

    /// Check that the upstream answers
    async fn health_check(&self) -> ArbitrageResult<bool> {
        self.fetch_observation().await.map(|_| true)
    }
}
