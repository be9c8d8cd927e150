use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use spread_arb_core::{
    ArbitrageError, ArbitrageResult, ScanReport, SpreadMonitor, TokenPair, TradeExecutor,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<SpreadMonitor>,
    pub executor: Arc<dyn TradeExecutor>,
    /// Most recent successful scan per pair
    pub latest: Arc<RwLock<HashMap<TokenPair, ScanReport>>>,
    pub max_snapshot_age_secs: i64,
}

impl AppState {
    pub fn new(
        monitor: SpreadMonitor,
        executor: Arc<dyn TradeExecutor>,
        max_snapshot_age_secs: i64,
    ) -> Self {
        Self {
            monitor: Arc::new(monitor),
            executor,
            latest: Arc::new(RwLock::new(HashMap::new())),
            max_snapshot_age_secs,
        }
    }

    /// Scan one pair now and store it as that pair's latest report
    pub async fn refresh(&self, pair: &TokenPair) -> ArbitrageResult<ScanReport> {
        let scanner = self
            .monitor
            .scanner(pair)
            .ok_or_else(|| ArbitrageError::InvalidInput(format!("pair {pair} is not monitored")))?;

        let report = scanner.scan().await?;
        self.latest
            .write()
            .await
            .insert(pair.clone(), report.clone());
        Ok(report)
    }

    /// Scan every pair, keeping the successful reports. Returns how many failed.
    pub async fn refresh_all(&self) -> usize {
        let scans = self.monitor.scan_all().await;
        let mut failed = 0;
        let mut latest = self.latest.write().await;

        for scan in scans {
            match scan.result {
                Ok(report) => {
                    if report.spread.opportunity_exists {
                        info!(
                            pair = %report.pair,
                            spread_pct = %report.spread.spread_percent,
                            direction = %report.spread.direction,
                            "Arbitrage opportunity"
                        );
                    } else {
                        debug!(
                            pair = %report.pair,
                            spread_pct = %report.spread.spread_percent,
                            "No opportunity"
                        );
                    }
                    latest.insert(scan.pair, report);
                }
                Err(e) => {
                    failed += 1;
                    warn!(pair = %scan.pair, "Spread poll failed: {}", e);
                }
            }
        }

        failed
    }

    pub async fn latest(&self, pair: &TokenPair) -> Option<ScanReport> {
        self.latest.read().await.get(pair).cloned()
    }

    /// Latest reports with an opportunity, largest absolute spread first
    pub async fn opportunities(&self) -> Vec<ScanReport> {
        let mut reports: Vec<ScanReport> = self
            .latest
            .read()
            .await
            .values()
            .filter(|report| report.spread.opportunity_exists)
            .cloned()
            .collect();
        reports.sort_by(|a, b| {
            b.spread
                .abs_spread_percent()
                .cmp(&a.spread.abs_spread_percent())
        });
        reports
    }
}

/// Background loop keeping `AppState::latest` fresh for every pair
pub async fn run_poller(state: AppState, period: Duration) {
    info!(
        "Spread poller started for {} pairs ({}ms interval)",
        state.monitor.scanners().len(),
        period.as_millis()
    );
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        state.refresh_all().await;
    }
}
