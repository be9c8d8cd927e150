use async_trait::async_trait;
use spread_arb_core::{ExecutionOutcome, ExecutionRequest, TradeExecutor};
use tracing::info;

/// Executor used when no exchange integration is configured.
///
/// Always refuses, so callers see a deterministic failure instead of a
/// fabricated fill.
pub struct DisabledExecutor;

#[async_trait]
impl TradeExecutor for DisabledExecutor {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn execute(&self, request: &ExecutionRequest) -> ExecutionOutcome {
        info!(
            request_id = %request.request_id,
            pair = %request.pair,
            "Execution requested but no venue is configured"
        );
        ExecutionOutcome::failure(format!(
            "Execution is disabled: no venue configured to trade {}",
            request.pair
        ))
    }
}
