// 🌐 REST API with Axum
// Exposes dashboard snapshots as JSON. Built only with the `server` feature.

use crate::dashboard::{DashboardService, DashboardSnapshot};
use crate::price::price_or_fallback;
use crate::transaction::TimeRange;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(service: DashboardService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    has_token: bool,
    mock: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    fn parse(&self) -> Result<TimeRange, String> {
        TimeRange::parse(
            self.range.as_deref().unwrap_or("all-time"),
            self.start.as_deref(),
            self.end.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceQuery {
    pub currency: Option<String>,
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        service: "paymetrics",
        version: crate::VERSION,
        timestamp: Utc::now().to_rfc3339(),
        has_token: state.service.config().has_token(),
        mock: state.service.is_mock(),
    }))
}

/// GET /api/dashboard - Fresh snapshot for the requested range
async fn get_dashboard(State(state): State<AppState>, Query(query): Query<RangeQuery>) -> Response {
    match query.parse() {
        Ok(range) => {
            let snapshot = state.service.refresh(range).await;
            (StatusCode::OK, Json(ApiResponse::ok(snapshot))).into_response()
        }
        Err(message) => bad_request(message),
    }
}

async fn current(state: &AppState) -> DashboardSnapshot {
    state.service.latest_or_refresh().await
}

/// GET /api/daily
async fn get_daily(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(current(&state).await.daily))
}

/// GET /api/stats
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(current(&state).await.stats))
}

/// GET /api/coffee
async fn get_coffee(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(current(&state).await.coffee))
}

/// GET /api/outgoing
async fn get_outgoing(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(current(&state).await.outgoing))
}

#[derive(Serialize)]
struct BalanceResponse {
    sats: u64,
    btc: f64,
    fiat: f64,
    currency: String,
}

/// GET /api/balance
async fn get_balance(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = current(&state).await;
    Json(ApiResponse::ok(BalanceResponse {
        sats: snapshot.balance_sats,
        btc: snapshot.balance_btc,
        fiat: snapshot.balance_fiat,
        currency: snapshot.price.currency,
    }))
}

/// GET /api/price?currency=eur
async fn get_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> impl IntoResponse {
    let config = state.service.config();
    let currency = query
        .currency
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| config.price_currency.clone());

    let quote = price_or_fallback(
        state.service.price_source(),
        &currency,
        config.fallback_price,
    )
    .await;
    Json(ApiResponse::ok(quote))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/daily", get(get_daily))
        .route("/stats", get(get_stats))
        .route("/coffee", get(get_coffee))
        .route("/outgoing", get(get_outgoing))
        .route("/balance", get(get_balance))
        .route("/price", get(get_price))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
