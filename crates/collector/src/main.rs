//! Spread Arbitrage Collector Service
//!
//! Polls the price feed and the on-chain pool for every configured pair, and
//! logs each spread that crosses the threshold.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use spread_arb_core::{config::Config, PairScan, ScanReport, SpreadMonitor};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},spread_arb_core=info", config.log_level)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Spread Arbitrage Collector");
    info!("Configuration loaded");
    info!("  Min spread threshold: {}%", config.min_spread_threshold);
    for market in &config.markets {
        info!("  {} - pool {}", market.pair, market.pool_address);
    }

    let monitor = SpreadMonitor::from_config(&config)?;
    info!("Monitoring {} trading pairs", monitor.scanners().len());

    // Health check all sources
    for scanner in monitor.scanners() {
        let pair = scanner.pair();
        for source in scanner.sources() {
            let (name, venue) = (source.name(), source.venue());
            match source.health_check().await {
                Ok(true) => info!("  {} {} ({}) - Connected", pair, name, venue),
                Ok(false) => warn!("  {} {} ({}) - Unhealthy", pair, name, venue),
                Err(e) => warn!("  {} {} ({}) - Error: {}", pair, name, venue, e),
            }
        }
    }

    info!(
        "Starting price collection loop ({}ms interval)",
        config.poll_interval_ms
    );
    let cycles = collect(
        &monitor,
        Duration::from_millis(config.poll_interval_ms),
        async {
            tokio::signal::ctrl_c().await.ok();
        },
    )
    .await;
    info!("Completed {} collection cycles", cycles);

    info!("Collector stopped");
    Ok(())
}

/// Scan every pair each `period` until `shutdown` resolves, even mid-scan.
/// Returns the number of completed cycles.
async fn collect(
    monitor: &SpreadMonitor,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) -> u64 {
    let mut interval = tokio::time::interval(period);
    let mut cycles = 0;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }

        tokio::select! {
            scans = monitor.scan_all() => {
                scans.iter().for_each(log_scan);
                cycles += 1;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received during scan");
                break;
            }
        }
    }

    cycles
}

fn log_scan(scan: &PairScan) {
    match &scan.result {
        Ok(report) => log_report(report),
        Err(e) if e.is_retryable() => {
            warn!("  {} | Scan skipped, will retry next tick: {}", scan.pair, e)
        }
        Err(e) => warn!("  {} | Scan rejected an observation: {}", scan.pair, e),
    }
}

fn log_report(report: &ScanReport) {
    let spread = &report.spread;
    if spread.opportunity_exists {
        info!(
            "  {} | {} @ {} vs {} @ {} | Spread: {:.4}% | {}",
            report.pair,
            report.venue_a.venue,
            spread.venue_a_price.round_dp(2),
            report.venue_b.venue,
            spread.venue_b_price.round_dp(2),
            spread.spread_percent,
            spread.direction
        );
    } else {
        debug!(
            "  {} | Spread: {:.4}% below {}%",
            report.pair, spread.spread_percent, spread.threshold_percent
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spread_arb_core::{
        sources::PriceSource, ArbitrageResult, PriceObservation, SpreadEvaluator, SpreadScanner,
        TokenPair, Venue,
    };
    use std::sync::Arc;

    /// Answers after `delay`
    struct SlowSource {
        venue: Venue,
        delay: Duration,
    }

    #[async_trait]
    impl PriceSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        fn venue(&self) -> Venue {
            self.venue
        }

        async fn fetch_observation(&self) -> ArbitrageResult<PriceObservation> {
            tokio::time::sleep(self.delay).await;
            Ok(PriceObservation::decimal_usd(self.venue, 3400.0))
        }
    }

    fn monitor(delay: Duration) -> SpreadMonitor {
        let scanner = SpreadScanner::new(
            TokenPair::new("ETH", "USDC"),
            Arc::new(SlowSource {
                venue: Venue::A,
                delay,
            }),
            Arc::new(SlowSource {
                venue: Venue::B,
                delay,
            }),
            SpreadEvaluator::default(),
        )
        .unwrap();
        SpreadMonitor::new(vec![scanner]).unwrap()
    }

    #[tokio::test]
    async fn test_shutdown_during_scan_stops_loop() {
        let monitor = monitor(Duration::from_secs(30));
        let shutdown = tokio::time::sleep(Duration::from_millis(50));

        let cycles = tokio::time::timeout(
            Duration::from_secs(5),
            collect(&monitor, Duration::from_millis(10), shutdown),
        )
        .await
        .expect("collector should stop while a scan is in flight");
        assert_eq!(cycles, 0);
    }

    #[tokio::test]
    async fn test_runs_cycles_until_shutdown() {
        let monitor = monitor(Duration::ZERO);
        let shutdown = tokio::time::sleep(Duration::from_millis(200));

        let cycles = collect(&monitor, Duration::from_millis(10), shutdown).await;
        assert!(cycles >= 2, "only {cycles} cycles ran");
    }
}
