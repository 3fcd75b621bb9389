// HTTP API routes, exercised in-process with tower's oneshot
#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use paymetrics::api::{router, AppState};
use paymetrics::{
    Config, DashboardError, DashboardService, Direction, MockWallet, PriceOrigin, PriceQuote,
    PriceSource, Result, TxStatus, WalletTransaction,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct FixedPrice(f64);

#[async_trait]
impl PriceSource for FixedPrice {
    async fn fetch_price(&self, currency: &str) -> Result<PriceQuote> {
        if currency == "xyz" {
            return Err(DashboardError::price("unsupported"));
        }
        let now = Utc::now();
        Ok(PriceQuote {
            currency: currency.to_uppercase(),
            price: self.0,
            last_updated: now,
            fetched_at: now,
            source: PriceOrigin::CoinGecko,
            error: None,
        })
    }
}

fn app() -> axum::Router {
    let now = Utc::now();
    let yesterday = now - Duration::days(1);
    let transactions = vec![
        WalletTransaction::new("r1", Direction::Receive, TxStatus::Success, 2_500, yesterday),
        WalletTransaction::new("r2", Direction::Receive, TxStatus::Success, 5_000, now),
        WalletTransaction::new("s1", Direction::Send, TxStatus::Success, -1_000, now),
        WalletTransaction::new(
            "old",
            Direction::Receive,
            TxStatus::Success,
            2_500,
            Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap(),
        ),
    ];

    let service = DashboardService::new(
        Arc::new(MockWallet::from_transactions(transactions).with_balance(40_000)),
        Arc::new(FixedPrice(100_000.0)),
        Config::default(),
    );
    router(AppState::new(service))
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["has_token"], false);
    assert_eq!(body["data"]["mock"], true);
}

#[tokio::test]
async fn test_dashboard_all_time() {
    let (status, body) = get_json(app(), "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["balance_sats"], 40_000);
    assert_eq!(data["stats"]["total_transactions"], 3);
    assert_eq!(data["stats"]["total_euros"], 10.0);
    assert_eq!(data["coffee"]["smart_coffee_count"], 4);
    assert_eq!(data["coffee"]["total_sent"], 1.0);
    assert_eq!(data["outgoing"].as_array().unwrap().len(), 1);
    assert_eq!(data["errors"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_custom_range() {
    let (status, body) = get_json(
        app(),
        "/api/dashboard?range=custom&start=2025-01-01&end=2025-02-28",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["daily"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["daily"][0]["date"], "2025-02-01");
    assert_eq!(body["data"]["outgoing"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_rejects_bad_range() {
    let (status, body) = get_json(app(), "/api/dashboard?range=custom&start=2025-03-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("end date"));
}

#[tokio::test]
async fn test_section_endpoints_refresh_on_demand() {
    let (status, body) = get_json(app(), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_coffees"], 4);

    let (_, body) = get_json(app(), "/api/daily").await;
    assert!(body["data"].as_array().unwrap().len() >= 2);

    let (_, body) = get_json(app(), "/api/coffee").await;
    assert_eq!(body["data"]["coffee_price"], 2.5);

    let (_, body) = get_json(app(), "/api/outgoing").await;
    assert_eq!(body["data"][0]["currency"], "EUR");

    let (_, body) = get_json(app(), "/api/balance").await;
    assert_eq!(body["data"]["sats"], 40_000);
    assert_eq!(body["data"]["fiat"], 40.0);
}

#[tokio::test]
async fn test_price_endpoint() {
    let (_, body) = get_json(app(), "/api/price?currency=usd").await;
    assert_eq!(body["data"]["currency"], "USD");
    assert_eq!(body["data"]["source"], "CoinGecko");

    let (_, body) = get_json(app(), "/api/price?currency=xyz").await;
    assert_eq!(body["data"]["source"], "Fallback");
    assert_eq!(body["data"]["price"], 52_000.0);
}

#[tokio::test]
async fn test_section_endpoints_ignore_last_dashboard_range() {
    let app = app();
    let (_, body) = get_json(
        app.clone(),
        "/api/dashboard?range=custom&start=2025-01-01&end=2025-02-28",
    )
    .await;
    assert_eq!(body["data"]["stats"]["total_transactions"], 1);

    let (status, body) = get_json(app, "/api/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_transactions"], 3);
}
