use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use spread_arb_core::{
    ArbitrageError, ExecutionOutcome, ExecutionRequest, ScanReport, SpreadScanner, TokenPair,
    TradeDirection, TradeExecutor, Venue,
};

use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/pairs", get(get_pairs))
        .route("/api/prices/feed", get(get_feed_price))
        .route("/api/prices/pool", get(get_pool_price))
        .route("/api/arbitrage", get(get_arbitrage))
        .route("/api/opportunities", get(get_opportunities))
        .route("/api/execute", post(post_execute))
        .with_state(state)
}

// ===== Route Handlers =====

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_pairs(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.monitor.pairs().map(TokenPair::symbol).collect())
}

async fn get_feed_price(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PriceResponse>, ApiError> {
    venue_price(&state, &query, Venue::A).await
}

async fn get_pool_price(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PriceResponse>, ApiError> {
    venue_price(&state, &query, Venue::B).await
}

async fn venue_price(
    state: &AppState,
    query: &PairQuery,
    venue: Venue,
) -> Result<Json<PriceResponse>, ApiError> {
    let scanner = resolve_scanner(state, query.pair.as_deref())?;
    let price = scanner.fetch_normalized(venue).await?;
    Ok(Json(PriceResponse {
        pair: scanner.pair().symbol(),
        venue: price.venue,
        price: price.usd_price,
    }))
}

/// Scan one pair now and report the spread; defaults to the first pair
async fn get_arbitrage(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> Result<Json<ArbitrageResponse>, ApiError> {
    let pair = resolve_scanner(&state, query.pair.as_deref())?.pair().clone();
    let report = state.refresh(&pair).await?;
    Ok(Json(ArbitrageResponse::from(&report)))
}

/// Latest polled opportunities across all pairs, best first
async fn get_opportunities(State(state): State<AppState>) -> Json<Vec<OpportunityView>> {
    let opportunities = state
        .opportunities()
        .await
        .iter()
        .map(OpportunityView::from)
        .collect();
    Json(opportunities)
}

async fn post_execute(
    State(state): State<AppState>,
    Json(body): Json<ExecuteBody>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let pair = resolve_scanner(&state, Some(body.pair.as_str()))?.pair().clone();

    let report = state
        .latest(&pair)
        .await
        .ok_or_else(|| ApiError::Unavailable(format!("No spread evaluated yet for {pair}")))?;

    if report.is_stale(Utc::now(), state.max_snapshot_age_secs) {
        return Err(ApiError::Conflict(format!(
            "Latest spread for {pair} is older than {}s",
            state.max_snapshot_age_secs
        )));
    }

    let request = ExecutionRequest::for_opportunity(pair, report.spread)
        .map_err(|e| ApiError::Conflict(e.to_string()))?;

    let outcome = state.executor.execute(&request).await;
    tracing::info!(
        request_id = %request.request_id,
        pair = %request.pair,
        executor = state.executor.name(),
        success = outcome.success,
        "Execution finished"
    );

    Ok(Json(ExecuteResponse {
        request_id: request.request_id.to_string(),
        outcome,
    }))
}

/// Look up the scanner for a requested pair, or the first one when none is named
fn resolve_scanner<'a>(
    state: &'a AppState,
    pair: Option<&str>,
) -> Result<&'a SpreadScanner, ApiError> {
    let Some(pair) = pair else {
        return Ok(state.monitor.primary());
    };

    pair.parse::<TokenPair>()
        .ok()
        .and_then(|pair| state.monitor.scanner(&pair))
        .ok_or_else(|| ApiError::BadRequest("Invalid token pair".to_string()))
}

// ===== Request / Response Types =====

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize)]
struct PairQuery {
    pair: Option<String>,
}

#[derive(Serialize)]
struct PriceResponse {
    pair: String,
    venue: Venue,
    price: Decimal,
}

#[derive(Serialize)]
struct ArbitrageResponse {
    pair: String,
    venue_a_price: Decimal,
    venue_b_price: Decimal,
    spread_percent: Decimal,
    /// Absolute spread, percent
    arb_opportunity: Decimal,
    opportunity_exists: bool,
    direction: TradeDirection,
    message: String,
    /// Time of the older venue reading
    observed_at: DateTime<Utc>,
    evaluated_at: DateTime<Utc>,
}

impl From<&ScanReport> for ArbitrageResponse {
    fn from(report: &ScanReport) -> Self {
        let spread = &report.spread;
        Self {
            pair: report.pair.symbol(),
            venue_a_price: spread.venue_a_price,
            venue_b_price: spread.venue_b_price,
            spread_percent: spread.spread_percent,
            arb_opportunity: spread.abs_spread_percent(),
            opportunity_exists: spread.opportunity_exists,
            direction: spread.direction,
            message: spread.summary().to_string(),
            observed_at: report.observed_at(),
            evaluated_at: report.evaluated_at,
        }
    }
}

#[derive(Serialize)]
struct OpportunityView {
    pair: String,
    venue_a_price: Decimal,
    venue_b_price: Decimal,
    profit_percentage: Decimal,
    direction: TradeDirection,
    evaluated_at: DateTime<Utc>,
}

impl From<&ScanReport> for OpportunityView {
    fn from(report: &ScanReport) -> Self {
        Self {
            pair: report.pair.symbol(),
            venue_a_price: report.spread.venue_a_price,
            venue_b_price: report.spread.venue_b_price,
            profit_percentage: report.spread.abs_spread_percent(),
            direction: report.spread.direction,
            evaluated_at: report.evaluated_at,
        }
    }
}

#[derive(Deserialize)]
struct ExecuteBody {
    pair: String,
}

#[derive(Serialize)]
struct ExecuteResponse {
    request_id: String,
    #[serde(flatten)]
    outcome: ExecutionOutcome,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    /// An upstream venue could not be reached
    Upstream(ArbitrageError),
    /// A venue answered with an unusable price
    Validation(ArbitrageError),
    Internal(ArbitrageError),
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
}

impl From<ArbitrageError> for ApiError {
    fn from(err: ArbitrageError) -> Self {
        if err.is_validation() {
            ApiError::Validation(err)
        } else if err.is_retryable() {
            ApiError::Upstream(err)
        } else {
            ApiError::Internal(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Upstream(err) => {
                tracing::warn!("Price fetch failed: {}", err);
                (StatusCode::BAD_GATEWAY, "Failed to fetch prices".to_string())
            }
            ApiError::Validation(err) => {
                tracing::warn!("Rejected price observation: {}", err);
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
