//! Core types for the spread arbitrage system

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ArbitrageError;

/// The two price venues being compared.
///
/// Venue A is the centralized price feed, venue B the on-chain pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    #[serde(rename = "venue_a")]
    A,
    #[serde(rename = "venue_b")]
    B,
}

impl Venue {
    /// Returns the display name for this venue
    pub fn display_name(&self) -> &'static str {
        match self {
            Venue::A => "Venue A",
            Venue::B => "Venue B",
        }
    }

    pub fn other(&self) -> Venue {
        match self {
            Venue::A => Venue::B,
            Venue::B => Venue::A,
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Represents a trading pair of tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// Base token symbol
    pub base: String,
    /// Quote token symbol
    pub quote: String,
}

impl TokenPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Returns the pair as a symbol string (e.g., "ETH/USDC")
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl std::fmt::Display for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for TokenPair {
    type Err = ArbitrageError;

    /// Accepts `BASE/QUOTE` or exchange-style `BASE-QUOTE`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .trim()
            .split_once(['/', '-'])
            .ok_or_else(|| ArbitrageError::InvalidInput(format!("unrecognized token pair '{s}'")))?;

        let base = base.trim().to_uppercase();
        let quote = quote.trim().to_uppercase();
        if base.is_empty() || quote.is_empty() || quote.contains(['/', '-']) {
            return Err(ArbitrageError::InvalidInput(format!(
                "unrecognized token pair '{s}'"
            )));
        }

        Ok(Self::new(base, quote))
    }
}

/// Parameters of a pool's Q64.96 square-root price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqrtPriceEncoding {
    /// Decimals of the priced asset (18 for WETH)
    pub base_decimals: u8,
    /// Decimals of the USD-pegged asset (6 for USDC)
    pub quote_decimals: u8,
    /// Whether the base asset is the pool's token0. When it is not, the
    /// pool ratio is quote-per-base inverted and must be flipped.
    pub base_is_token0: bool,
}

impl SqrtPriceEncoding {
    pub fn new(base_decimals: u8, quote_decimals: u8, base_is_token0: bool) -> Self {
        Self {
            base_decimals,
            quote_decimals,
            base_is_token0,
        }
    }

    /// Exponent applied to the raw ratio: `base_decimals - quote_decimals`.
    pub fn decimal_shift(&self) -> i32 {
        i32::from(self.base_decimals) - i32::from(self.quote_decimals)
    }
}

impl Default for SqrtPriceEncoding {
    /// ETH (18 decimals) priced in USDC (6 decimals), ETH as token0.
    fn default() -> Self {
        Self::new(18, 6, true)
    }
}

/// Encoding of a raw price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFormat {
    /// Already a plain USD decimal
    DecimalUsd,
    /// Pool `sqrtPriceX96` slot value
    SqrtPriceX96(SqrtPriceEncoding),
}

impl SourceFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::DecimalUsd => "decimal_usd",
            SourceFormat::SqrtPriceX96(_) => "sqrt_price_x96",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = ArbitrageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decimal_usd" | "decimalusd" => Ok(SourceFormat::DecimalUsd),
            "sqrt_price_x96" | "sqrtpricex96" | "sqrt_price_x96_fixed" => {
                Ok(SourceFormat::SqrtPriceX96(SqrtPriceEncoding::default()))
            }
            other => Err(ArbitrageError::InvalidPriceFormat(format!(
                "unrecognized source format '{other}'"
            ))),
        }
    }
}

/// A raw price reading from one venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceObservation {
    pub venue: Venue,
    pub raw_value: f64,
    pub source_format: SourceFormat,
    /// When the adapter produced this reading
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    pub fn new(venue: Venue, raw_value: f64, source_format: SourceFormat) -> Self {
        Self {
            venue,
            raw_value,
            source_format,
            observed_at: Utc::now(),
        }
    }

    pub fn decimal_usd(venue: Venue, price: f64) -> Self {
        Self::new(venue, price, SourceFormat::DecimalUsd)
    }

    pub fn sqrt_price_x96(venue: Venue, raw: f64, encoding: SqrtPriceEncoding) -> Self {
        Self::new(venue, raw, SourceFormat::SqrtPriceX96(encoding))
    }
}

/// A price in USD, comparable across venues.
///
/// Produced by [`crate::pricing::normalize`], which guarantees
/// `usd_price > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPrice {
    pub venue: Venue,
    pub usd_price: Decimal,
}

/// Which side of the spread to trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    /// Venue A is cheaper: buy there, sell on venue B
    BuyASellB,
    /// Venue B is cheaper: buy there, sell on venue A
    BuyBSellA,
    None,
}

impl TradeDirection {
    pub fn buy_venue(&self) -> Option<Venue> {
        match self {
            TradeDirection::BuyASellB => Some(Venue::A),
            TradeDirection::BuyBSellA => Some(Venue::B),
            TradeDirection::None => None,
        }
    }

    pub fn sell_venue(&self) -> Option<Venue> {
        self.buy_venue().map(|v| v.other())
    }
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::BuyASellB => write!(f, "buy {} / sell {}", Venue::A, Venue::B),
            TradeDirection::BuyBSellA => write!(f, "buy {} / sell {}", Venue::B, Venue::A),
            TradeDirection::None => write!(f, "none"),
        }
    }
}

/// Verdict of a single spread evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadResult {
    pub venue_a_price: Decimal,
    pub venue_b_price: Decimal,
    /// `(B - A) / A * 100`; positive when venue B is more expensive
    pub spread_percent: Decimal,
    /// Threshold the verdict was computed against, in percent
    pub threshold_percent: Decimal,
    pub opportunity_exists: bool,
    pub direction: TradeDirection,
}

impl SpreadResult {
    pub fn abs_spread_percent(&self) -> Decimal {
        self.spread_percent.abs()
    }

    pub fn summary(&self) -> &'static str {
        if self.opportunity_exists {
            "Arbitrage opportunity exists!"
        } else {
            "No significant arbitrage opportunity"
        }
    }
}
