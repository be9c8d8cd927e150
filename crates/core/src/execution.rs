//! Execution contract
//!
//! The core never trades. It only describes what an execution collaborator
//! receives and what it must answer; exchange and DEX integrations implement
//! [`TradeExecutor`] outside this crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ArbitrageError, ArbitrageResult};
use crate::types::{SpreadResult, TokenPair};

/// An opportunity handed to an executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub request_id: Uuid,
    pub pair: TokenPair,
    pub spread: SpreadResult,
}

impl ExecutionRequest {
    /// Build a request, refusing spreads that are not opportunities.
    pub fn for_opportunity(pair: TokenPair, spread: SpreadResult) -> ArbitrageResult<Self> {
        if !spread.opportunity_exists {
            return Err(ArbitrageError::InvalidInput(format!(
                "no arbitrage opportunity for {pair}"
            )));
        }
        Ok(Self {
            request_id: Uuid::new_v4(),
            pair,
            spread,
        })
    }
}

/// Pass/fail answer from an executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Trait implemented by execution collaborators
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// Attempt the trade. Failures are reported in the outcome, not as errors.
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionOutcome;
}
