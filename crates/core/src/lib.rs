//! Spread Arbitrage Core Library
//!
//! This crate normalizes prices from a centralized price feed and an on-chain
//! pool, computes their percentage spread and decides whether it crosses the
//! profitability threshold. Venue adapters and the concurrent per-pair
//! scanners that feed it live here too; execution is only described, never performed.

pub mod arbitrage;
pub mod config;
pub mod error;
pub mod execution;
#[cfg(feature = "http")]
pub mod http;
pub mod pricing;
pub mod sources;
pub mod types;


pub use arbitrage::{evaluate_spread, SpreadEvaluator, DEFAULT_SPREAD_THRESHOLD};
pub use error::*;
pub use execution::{ExecutionOutcome, ExecutionRequest, TradeExecutor};
pub use pricing::{normalize, PairScan, ScanReport, SpreadMonitor, SpreadScanner};
pub use types::*;
