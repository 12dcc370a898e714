//! Yahoo Finance client (§6.3) — unofficial, keyless fallback used by
//! almost every bot. Rate-limited gently (§4.2) since there is no
//! published quota to respect.

use market_core::ResearchError;
use serde_json::Value;

use crate::http_client::BotHttpClient;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Client for Yahoo's unauthenticated v8/v10 endpoints.
pub struct YahooClient {
    http: BotHttpClient,
}

impl YahooClient {
    /// Build a client.
    #[must_use]
    pub fn new(http: BotHttpClient) -> Self {
        Self { http }
    }

    /// `GET /v8/finance/chart/{symbol}` — one year of daily OHLCV bars.
    pub async fn chart(&self, symbol: &str) -> Result<Value, ResearchError> {
        let url = format!("{CHART_BASE_URL}/{symbol}?range=1y&interval=1d");
        self.http.get_json("yahoo", &url).await
    }

    /// `GET /v10/finance/quoteSummary/{symbol}?modules=...` — fundamentals,
    /// earnings, analyst, and recommendation modules.
    pub async fn quote_summary(&self, symbol: &str, modules: &[&str]) -> Result<Value, ResearchError> {
        let url = format!(
            "{QUOTE_SUMMARY_BASE_URL}/{symbol}?modules={}",
            modules.join(",")
        );
        self.http.get_json("yahoo", &url).await
    }
}
