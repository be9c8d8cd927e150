//! Multi-pair monitor
//!
//! Holds one [`SpreadScanner`] per configured market and scans them all
//! concurrently each cycle.

use futures_util::future::join_all;
use std::collections::HashSet;

use crate::error::{ArbitrageError, ArbitrageResult};
use crate::pricing::{ScanReport, SpreadScanner};
use crate::types::TokenPair;

/// Result of scanning one pair in a cycle
#[derive(Debug)]
pub struct PairScan {
    pub pair: TokenPair,
    pub result: ArbitrageResult<ScanReport>,
}

/// Scanners for every monitored pair, in configuration order
pub struct SpreadMonitor {
    scanners: Vec<SpreadScanner>,
}

impl SpreadMonitor {
    /// Fails when `scanners` is empty or two scanners share a pair.
    pub fn new(scanners: Vec<SpreadScanner>) -> ArbitrageResult<Self> {
        if scanners.is_empty() {
            return Err(ArbitrageError::InvalidInput(
                "a monitor needs at least one pair".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for scanner in &scanners {
            if !seen.insert(scanner.pair()) {
                return Err(ArbitrageError::InvalidInput(format!(
                    "pair {} is monitored twice",
                    scanner.pair()
                )));
            }
        }

        Ok(Self { scanners })
    }

    pub fn scanners(&self) -> &[SpreadScanner] {
        &self.scanners
    }

    pub fn pairs(&self) -> impl Iterator<Item = &TokenPair> {
        self.scanners.iter().map(SpreadScanner::pair)
    }

    /// The first configured scanner
    pub fn primary(&self) -> &SpreadScanner {
        &self.scanners[0]
    }

    pub fn scanner(&self, pair: &TokenPair) -> Option<&SpreadScanner> {
        self.scanners.iter().find(|scanner| scanner.pair() == pair)
    }

    /// Scan every pair at once. One pair failing leaves the others intact.
    pub async fn scan_all(&self) -> Vec<PairScan> {
        let results = join_all(self.scanners.iter().map(|scanner| scanner.scan())).await;

        self.scanners
            .iter()
            .zip(results)
            .map(|(scanner, result)| PairScan {
                pair: scanner.pair().clone(),
                result,
            })
            .collect()
    }
}

#[cfg(feature = "http")]
mod wiring {
    use std::sync::Arc;
    use std::time::Duration;

    use super::SpreadMonitor;
    use crate::arbitrage::SpreadEvaluator;
    use crate::config::Config;
    use crate::error::ArbitrageResult;
    use crate::http::create_client;
    use crate::pricing::SpreadScanner;
    use crate::sources::{CoinGeckoSource, PriceSource, UniswapV3PoolSource};

    impl SpreadMonitor {
        /// One feed/pool scanner per configured market over a shared HTTP client
        pub fn from_config(config: &Config) -> ArbitrageResult<Self> {
            let client = create_client(Duration::from_millis(config.request_timeout_ms))?;
            let evaluator = SpreadEvaluator::new(config.min_spread_threshold)?;

            let scanners = config
                .markets
                .iter()
                .map(|market| {
                    let feed: Arc<dyn PriceSource> = Arc::new(CoinGeckoSource::new(
                        client.clone(),
                        config.price_feed_url.clone(),
                        market.feed_asset_id.clone(),
                        config.price_feed_vs_currency.clone(),
                    ));
                    let pool: Arc<dyn PriceSource> = Arc::new(UniswapV3PoolSource::new(
                        client.clone(),
                        config.eth_rpc_url.clone(),
                        market.pool_address.clone(),
                        market.pool_encoding,
                    ));
                    SpreadScanner::new(market.pair.clone(), feed, pool, evaluator)
                })
                .collect::<ArbitrageResult<Vec<_>>>()?;

            Self::new(scanners)
        }
    }
}
