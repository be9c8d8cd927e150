//! Configuration module for the spread arbitrage system

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::env;
use std::str::FromStr;

use crate::arbitrage::DEFAULT_SPREAD_THRESHOLD;
use crate::error::{ArbitrageError, ArbitrageResult};
use crate::types::{SqrtPriceEncoding, TokenPair};

pub const DEFAULT_PRICE_FEED_URL: &str = "https://api.coingecko.com/api/v3";
/// Mainnet USDC/WETH 0.3% pool
pub const DEFAULT_POOL_ADDRESS: &str = "0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8";
const PUBLIC_RPC_URL: &str = "https://cloudflare-eth.com";
const INFURA_RPC_URL: &str = "https://mainnet.infura.io/v3/";

/// One monitored pair: where each venue quotes it.
///
/// Parsed from `PAIR,asset_id,pool_address,base_decimals,quote_decimals,base_is_token0`,
/// e.g. `ETH/USDC,ethereum,0x8ad5...,18,6,false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketConfig {
    pub pair: TokenPair,
    /// Venue A asset identifier
    pub feed_asset_id: String,
    /// Venue B pool address
    pub pool_address: String,
    /// Venue B token layout
    pub pool_encoding: SqrtPriceEncoding,
}

impl FromStr for MarketConfig {
    type Err = ArbitrageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        let &[pair, asset_id, pool, base_decimals, quote_decimals, base_is_token0] =
            fields.as_slice()
        else {
            return Err(ArbitrageError::Config(format!(
                "market '{s}' must have 6 comma-separated fields"
            )));
        };

        let field = |name: &str, e: &dyn std::fmt::Display| {
            ArbitrageError::Config(format!("market '{s}': invalid {name}: {e}"))
        };

        Ok(Self {
            pair: pair.parse().map_err(|e| field("pair", &e))?,
            feed_asset_id: asset_id.to_string(),
            pool_address: pool.to_string(),
            pool_encoding: SqrtPriceEncoding::new(
                base_decimals.parse().map_err(|e| field("base decimals", &e))?,
                quote_decimals.parse().map_err(|e| field("quote decimals", &e))?,
                base_is_token0.parse().map_err(|e| field("token ordering", &e))?,
            ),
        })
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            pair: TokenPair::new("ETH", "USDC"),
            feed_asset_id: "ethereum".to_string(),
            pool_address: DEFAULT_POOL_ADDRESS.to_string(),
            // USDC is token0 in the default pool
            pool_encoding: SqrtPriceEncoding::new(18, 6, false),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Venue A price feed base URL
    pub price_feed_url: String,
    /// Venue A quote currency
    pub price_feed_vs_currency: String,
    /// Ethereum JSON-RPC URL
    pub eth_rpc_url: String,
    /// Monitored pairs; the first is the API's default
    pub markets: Vec<MarketConfig>,
    /// Minimum spread percentage that counts as an opportunity
    pub min_spread_threshold: Decimal,
    /// Polling period in milliseconds
    pub poll_interval_ms: u64,
    /// Per-request timeout for the price sources
    pub request_timeout_ms: u64,
    /// Verdicts older than this are not executed
    pub max_snapshot_age_secs: i64,
    /// API server port
    pub api_port: u16,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> ArbitrageResult<Self> {
        let defaults = Self::default();

        let eth_rpc_url = match env::var("ETH_RPC_URL") {
            Ok(url) => url,
            Err(_) => rpc_url_for(env::var("INFURA_API_KEY").ok().as_deref()),
        };

        let markets = match env::var("TRADING_PAIRS") {
            Ok(list) => parse_markets(&list)?,
            Err(_) => vec![single_market_from_env()?],
        };

        let config = Self {
            price_feed_url: env::var("PRICE_FEED_URL").unwrap_or(defaults.price_feed_url),
            price_feed_vs_currency: env::var("PRICE_FEED_VS_CURRENCY")
                .unwrap_or(defaults.price_feed_vs_currency),
            eth_rpc_url,
            markets,
            min_spread_threshold: parse_var("MIN_SPREAD_THRESHOLD", defaults.min_spread_threshold)?,
            poll_interval_ms: parse_var("POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,
            max_snapshot_age_secs: parse_var("MAX_SNAPSHOT_AGE_SECS", defaults.max_snapshot_age_secs)?,
            api_port: parse_var("API_PORT", defaults.api_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ArbitrageResult<()> {
        if self.min_spread_threshold < Decimal::ZERO {
            return Err(ArbitrageError::Config(format!(
                "MIN_SPREAD_THRESHOLD must be non-negative, got {}",
                self.min_spread_threshold
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ArbitrageError::Config("POLL_INTERVAL_MS must be positive".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ArbitrageError::Config("REQUEST_TIMEOUT_MS must be positive".to_string()));
        }
        if self.max_snapshot_age_secs <= 0 {
            return Err(ArbitrageError::Config(
                "MAX_SNAPSHOT_AGE_SECS must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("PRICE_FEED_URL", &self.price_feed_url),
            ("ETH_RPC_URL", &self.eth_rpc_url),
        ] {
            if value.trim().is_empty() {
                return Err(ArbitrageError::Config(format!("{name} must not be empty")));
            }
        }

        if self.markets.is_empty() {
            return Err(ArbitrageError::Config(
                "at least one market must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for market in &self.markets {
            if !seen.insert(&market.pair) {
                return Err(ArbitrageError::Config(format!(
                    "market {} is configured twice",
                    market.pair
                )));
            }
            if market.feed_asset_id.is_empty() || market.pool_address.is_empty() {
                return Err(ArbitrageError::Config(format!(
                    "market {} needs a feed asset id and a pool address",
                    market.pair
                )));
            }
            let encoding = market.pool_encoding;
            if encoding.base_decimals > 36 || encoding.quote_decimals > 36 {
                return Err(ArbitrageError::Config(format!(
                    "market {}: pool token decimals must not exceed 36",
                    market.pair
                )));
            }
        }
        Ok(())
    }

    /// The pair the API answers for when a request names none
    pub fn primary_pair(&self) -> Option<&TokenPair> {
        self.markets.first().map(|market| &market.pair)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            price_feed_url: DEFAULT_PRICE_FEED_URL.to_string(),
            price_feed_vs_currency: "usd".to_string(),
            eth_rpc_url: PUBLIC_RPC_URL.to_string(),
            markets: vec![MarketConfig::default()],
            min_spread_threshold: DEFAULT_SPREAD_THRESHOLD,
            poll_interval_ms: 10_000,
            request_timeout_ms: 5_000,
            max_snapshot_age_secs: 60,
            api_port: 8080,
            log_level: "info".to_string(),
        }
    }
}

/// `TRADING_PAIRS`: markets separated by `;`
fn parse_markets(list: &str) -> ArbitrageResult<Vec<MarketConfig>> {
    list.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(MarketConfig::from_str)
        .collect()
}

/// A single market from `TRADING_PAIR`, `PRICE_FEED_ASSET_ID` and the `POOL_*` variables
fn single_market_from_env() -> ArbitrageResult<MarketConfig> {
    let defaults = MarketConfig::default();
    Ok(MarketConfig {
        pair: parse_var("TRADING_PAIR", defaults.pair)?,
        feed_asset_id: env::var("PRICE_FEED_ASSET_ID").unwrap_or(defaults.feed_asset_id),
        pool_address: env::var("POOL_ADDRESS").unwrap_or(defaults.pool_address),
        pool_encoding: SqrtPriceEncoding::new(
            parse_var("POOL_BASE_DECIMALS", defaults.pool_encoding.base_decimals)?,
            parse_var("POOL_QUOTE_DECIMALS", defaults.pool_encoding.quote_decimals)?,
            parse_var("POOL_BASE_IS_TOKEN0", defaults.pool_encoding.base_is_token0)?,
        ),
    })
}

fn rpc_url_for(infura_key: Option<&str>) -> String {
    match infura_key {
        Some(key) if !key.trim().is_empty() => format!("{INFURA_RPC_URL}{}", key.trim()),
        _ => PUBLIC_RPC_URL.to_string(),
    }
}

fn parse_var<T>(name: &str, default: T) -> ArbitrageResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| ArbitrageError::Config(format!("invalid {name} '{value}': {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_spread_threshold, Decimal::ONE);
        assert_eq!(config.primary_pair().unwrap().symbol(), "ETH/USDC");
        assert!(!config.markets[0].pool_encoding.base_is_token0);
    }

    #[test]
    fn test_rpc_url_selection() {
        assert_eq!(rpc_url_for(None), PUBLIC_RPC_URL);
        assert_eq!(rpc_url_for(Some("  ")), PUBLIC_RPC_URL);
        assert_eq!(
            rpc_url_for(Some("abc123")),
            "https://mainnet.infura.io/v3/abc123"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            min_spread_threshold: Decimal::new(-5, 1),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ArbitrageError::Config(_))));

        let config = Config {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            eth_rpc_url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_var_reports_name() {
        // Unique name so parallel tests never race on it
        env::set_var("SPREAD_ARB_TEST_PARSE_VAR", "not-a-number");
        let err = parse_var::<u64>("SPREAD_ARB_TEST_PARSE_VAR", 5).unwrap_err();
        assert!(err.to_string().contains("SPREAD_ARB_TEST_PARSE_VAR"));
        env::remove_var("SPREAD_ARB_TEST_PARSE_VAR");

        assert_eq!(parse_var::<u64>("SPREAD_ARB_TEST_UNSET_VAR", 5).unwrap(), 5);
    }

    #[test]
    fn test_parse_market_list() {
        let markets = parse_markets(
            "ETH/USDC,ethereum,0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8,18,6,false; \
             wbtc-usdc, wrapped-bitcoin, 0x99ac8ca7087fa4a2a1fb6357269965a2014abc35, 8, 6, true;",
        )
        .unwrap();

        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0], MarketConfig::default());
        assert_eq!(markets[1].pair, TokenPair::new("WBTC", "USDC"));
        assert_eq!(markets[1].feed_asset_id, "wrapped-bitcoin");
        assert_eq!(markets[1].pool_encoding, SqrtPriceEncoding::new(8, 6, true));
    }

    #[test]
    fn test_parse_market_rejects_malformed_entries() {
        for entry in [
            "ETH/USDC,ethereum,0xpool,18,6",
            "ETH/USDC,ethereum,0xpool,18,6,false,extra",
            "ETHUSDC,ethereum,0xpool,18,6,false",
            "ETH/USDC,ethereum,0xpool,eighteen,6,false",
            "ETH/USDC,ethereum,0xpool,18,6,maybe",
        ] {
            let err = entry.parse::<MarketConfig>().unwrap_err();
            assert!(matches!(err, ArbitrageError::Config(_)), "{entry}: {err:?}");
        }
    }

    #[test]
    fn test_validate_markets() {
        let config = Config {
            markets: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            markets: vec![MarketConfig::default(), MarketConfig::default()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("configured twice"));

        let config = Config {
            markets: vec![MarketConfig {
                pool_encoding: SqrtPriceEncoding::new(40, 6, true),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
