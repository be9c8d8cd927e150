//! Spread Evaluator
//!
//! Compares the normalized prices of the two venues for the same asset and
//! decides whether the spread crosses the profitability threshold.

use rust_decimal::Decimal;

use crate::error::{ArbitrageError, ArbitrageResult};
use crate::types::{NormalizedPrice, SpreadResult, TradeDirection, Venue};

/// Default profitability threshold in percent: `1` means a 1% spread
pub const DEFAULT_SPREAD_THRESHOLD: Decimal = Decimal::ONE;

/// Evaluate the spread between venue A and venue B.
///
/// `spread_percent = (B - A) / A * 100`. The threshold is inclusive: a spread
/// of exactly `threshold_percent` (in either direction) is an opportunity. A
/// zero spread never is, even against a zero threshold.
pub fn evaluate_spread(
    venue_a: &NormalizedPrice,
    venue_b: &NormalizedPrice,
    threshold_percent: Decimal,
) -> ArbitrageResult<SpreadResult> {
    if venue_a.venue != Venue::A || venue_b.venue != Venue::B {
        return Err(ArbitrageError::InvalidInput(format!(
            "expected prices from {} and {}, got {} and {}",
            Venue::A,
            Venue::B,
            venue_a.venue,
            venue_b.venue
        )));
    }
    check_threshold(threshold_percent)?;

    let price_a = venue_a.usd_price;
    let price_b = venue_b.usd_price;
    if price_a <= Decimal::ZERO || price_b <= Decimal::ZERO {
        return Err(ArbitrageError::InvalidInput(format!(
            "prices must be positive, got {price_a} and {price_b}"
        )));
    }

    let spread_percent = price_b
        .checked_sub(price_a)
        .and_then(|diff| diff.checked_div(price_a))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| {
            ArbitrageError::InvalidInput(format!(
                "spread between {price_a} and {price_b} is out of range"
            ))
        })?;

    let direction = if spread_percent > Decimal::ZERO && spread_percent >= threshold_percent {
        TradeDirection::BuyASellB
    } else if spread_percent < Decimal::ZERO && spread_percent <= -threshold_percent {
        TradeDirection::BuyBSellA
    } else {
        TradeDirection::None
    };

    Ok(SpreadResult {
        venue_a_price: price_a,
        venue_b_price: price_b,
        spread_percent,
        threshold_percent,
        opportunity_exists: direction != TradeDirection::None,
        direction,
    })
}

fn check_threshold(threshold_percent: Decimal) -> ArbitrageResult<()> {
    if threshold_percent < Decimal::ZERO {
        return Err(ArbitrageError::InvalidInput(format!(
            "threshold must be non-negative, got {threshold_percent}"
        )));
    }
    Ok(())
}

/// Spread evaluator bound to a configured threshold
#[derive(Debug, Clone, Copy)]
pub struct SpreadEvaluator {
    threshold_percent: Decimal,
}

impl SpreadEvaluator {
    /// `threshold_percent` is in percent (`0.5` is half a percent) and must
    /// not be negative.
    pub fn new(threshold_percent: Decimal) -> ArbitrageResult<Self> {
        check_threshold(threshold_percent)?;
        Ok(Self { threshold_percent })
    }

    /// Threshold in percent
    pub fn threshold_percent(&self) -> Decimal {
        self.threshold_percent
    }

    pub fn evaluate(
        &self,
        venue_a: &NormalizedPrice,
        venue_b: &NormalizedPrice,
    ) -> ArbitrageResult<SpreadResult> {
        evaluate_spread(venue_a, venue_b, self.threshold_percent)
    }
}

impl Default for SpreadEvaluator {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_SPREAD_THRESHOLD,
        }
    }
}
