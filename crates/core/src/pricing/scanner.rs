use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::arbitrage::SpreadEvaluator;
use crate::error::{ArbitrageError, ArbitrageResult};
use crate::pricing::normalize;
use crate::sources::PriceSource;
use crate::types::{NormalizedPrice, PriceObservation, SpreadResult, TokenPair, Venue};

/// Outcome of one fetch → normalize → evaluate cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub pair: TokenPair,
    /// Raw readings, venue A first
    pub observations: [PriceObservation; 2],
    pub venue_a: NormalizedPrice,
    pub venue_b: NormalizedPrice,
    pub spread: SpreadResult,
    pub evaluated_at: DateTime<Utc>,
}

impl ScanReport {
    /// When the older of the two readings was taken
    pub fn observed_at(&self) -> DateTime<Utc> {
        let [a, b] = &self.observations;
        a.observed_at.min(b.observed_at)
    }

    /// Whether the older reading is at least `max_age_seconds` old at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age_seconds: i64) -> bool {
        (now - self.observed_at()).num_seconds() >= max_age_seconds
    }
}

/// Fetches both venues concurrently and evaluates their spread.
pub struct SpreadScanner {
    pair: TokenPair,
    venue_a: Arc<dyn PriceSource>,
    venue_b: Arc<dyn PriceSource>,
    evaluator: SpreadEvaluator,
}

impl SpreadScanner {
    pub fn new(
        pair: TokenPair,
        venue_a: Arc<dyn PriceSource>,
        venue_b: Arc<dyn PriceSource>,
        evaluator: SpreadEvaluator,
    ) -> ArbitrageResult<Self> {
        if venue_a.venue() != Venue::A || venue_b.venue() != Venue::B {
            return Err(ArbitrageError::InvalidInput(format!(
                "sources must report {} and {}, got {} and {}",
                Venue::A,
                Venue::B,
                venue_a.venue(),
                venue_b.venue()
            )));
        }

        Ok(Self {
            pair,
            venue_a,
            venue_b,
            evaluator,
        })
    }

    pub fn pair(&self) -> &TokenPair {
        &self.pair
    }

    pub fn evaluator(&self) -> &SpreadEvaluator {
        &self.evaluator
    }

    pub fn sources(&self) -> [&dyn PriceSource; 2] {
        [self.venue_a.as_ref(), self.venue_b.as_ref()]
    }

    fn source(&self, venue: Venue) -> &dyn PriceSource {
        match venue {
            Venue::A => self.venue_a.as_ref(),
            Venue::B => self.venue_b.as_ref(),
        }
    }

    /// Issue both fetches at once; both must succeed.
    pub async fn fetch_observations(&self) -> ArbitrageResult<(PriceObservation, PriceObservation)> {
        let (a, b) = tokio::join!(
            self.venue_a.fetch_observation(),
            self.venue_b.fetch_observation()
        );
        Ok((a?, b?))
    }

    /// Fetch and normalize a single venue
    pub async fn fetch_normalized(&self, venue: Venue) -> ArbitrageResult<NormalizedPrice> {
        let observation = self.source(venue).fetch_observation().await?;
        normalize(&observation)
    }

    pub async fn scan(&self) -> ArbitrageResult<ScanReport> {
        let (obs_a, obs_b) = self.fetch_observations().await?;

        let venue_a = normalize(&obs_a)?;
        let venue_b = normalize(&obs_b)?;
        let spread = self.evaluator.evaluate(&venue_a, &venue_b)?;

        debug!(
            pair = %self.pair,
            venue_a = %venue_a.usd_price,
            venue_b = %venue_b.usd_price,
            spread_pct = %spread.spread_percent,
            direction = %spread.direction,
            "Spread evaluated"
        );

        Ok(ScanReport {
            pair: self.pair.clone(),
            observations: [obs_a, obs_b],
            venue_a,
            venue_b,
            spread,
            evaluated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::encode_sqrt_price_x96;
    use crate::types::{SourceFormat, SqrtPriceEncoding, TradeDirection};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    struct FixedSource {
        venue: Venue,
        observation: Option<PriceObservation>,
    }

    #[async_trait]
    impl PriceSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn venue(&self) -> Venue {
            self.venue
        }

        async fn fetch_observation(&self) -> ArbitrageResult<PriceObservation> {
            self.observation
                .clone()
                .ok_or_else(|| ArbitrageError::PriceFetch("connection reset".to_string()))
        }
    }

    fn feed(price: f64) -> Arc<dyn PriceSource> {
        Arc::new(FixedSource {
            venue: Venue::A,
            observation: Some(PriceObservation::decimal_usd(Venue::A, price)),
        })
    }

    fn pool(price: f64) -> Arc<dyn PriceSource> {
        let encoding = SqrtPriceEncoding::default();
        let raw = encode_sqrt_price_x96(price, &encoding).unwrap();
        Arc::new(FixedSource {
            venue: Venue::B,
            observation: Some(PriceObservation::sqrt_price_x96(Venue::B, raw, encoding)),
        })
    }

    fn broken(venue: Venue) -> Arc<dyn PriceSource> {
        Arc::new(FixedSource {
            venue,
            observation: None,
        })
    }

    fn scanner(a: Arc<dyn PriceSource>, b: Arc<dyn PriceSource>) -> SpreadScanner {
        SpreadScanner::new(TokenPair::new("ETH", "USDC"), a, b, SpreadEvaluator::default()).unwrap()
    }

    #[tokio::test]
    async fn test_scan_detects_opportunity() {
        let report = scanner(feed(3400.0), pool(3450.0)).scan().await.unwrap();
        assert_eq!(report.spread.direction, TradeDirection::BuyASellB);
        assert!(report.spread.opportunity_exists);
        assert_eq!(report.venue_a.usd_price, Decimal::from(3400));
        assert_eq!(report.pair.symbol(), "ETH/USDC");
    }

    #[tokio::test]
    async fn test_scan_small_spread() {
        let report = scanner(feed(55_000.0), pool(55_200.0)).scan().await.unwrap();
        assert!(!report.spread.opportunity_exists);
        assert!(report.spread.spread_percent > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_scan() {
        let err = scanner(feed(3400.0), broken(Venue::B)).scan().await.unwrap_err();
        assert!(matches!(err, ArbitrageError::PriceFetch(_)));

        let err = scanner(broken(Venue::A), pool(3400.0)).scan().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_observation_propagates() {
        let err = scanner(feed(0.0), pool(3400.0)).scan().await.unwrap_err();
        assert!(matches!(err, ArbitrageError::NonPositivePrice { venue: Venue::A, .. }));
    }

    #[tokio::test]
    async fn test_fetch_normalized_single_venue() {
        let scanner = scanner(feed(3400.0), pool(3450.0));
        let price = scanner.fetch_normalized(Venue::A).await.unwrap();
        assert_eq!(price.venue, Venue::A);
        assert_eq!(price.usd_price, Decimal::from(3400));
    }

    #[test]
    fn test_rejects_swapped_sources() {
        let result = SpreadScanner::new(
            TokenPair::new("ETH", "USDC"),
            pool(3400.0),
            feed(3400.0),
            SpreadEvaluator::default(),
        );
        assert!(matches!(result, Err(ArbitrageError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_report_keeps_observations() {
        let report = scanner(feed(3400.0), pool(3450.0)).scan().await.unwrap();
        let [a, b] = &report.observations;
        assert_eq!(a.venue, Venue::A);
        assert_eq!(a.raw_value, 3400.0);
        assert_eq!(b.venue, Venue::B);
        assert!(matches!(b.source_format, SourceFormat::SqrtPriceX96(_)));
        assert!(report.observed_at() <= report.evaluated_at);
    }

    #[tokio::test]
    async fn test_report_staleness_follows_oldest_observation() {
        let mut report = scanner(feed(3400.0), pool(3450.0)).scan().await.unwrap();
        let now = report.evaluated_at;
        assert!(!report.is_stale(now, 60));
        assert!(report.is_stale(now + chrono::Duration::seconds(61), 60));

        // A fresh verdict built on an old pool reading is still stale
        report.observations[1].observed_at = now - chrono::Duration::seconds(90);
        assert_eq!(report.observed_at(), now - chrono::Duration::seconds(90));
        assert!(report.is_stale(now, 60));
    }
}
