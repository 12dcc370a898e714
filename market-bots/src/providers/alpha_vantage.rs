//! Alpha Vantage client (§6.3) — last-resort `EarningsBot` fallback.

use market_core::ResearchError;
use serde_json::Value;

use crate::http_client::BotHttpClient;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Client for Alpha Vantage's `EARNINGS` function.
pub struct AlphaVantageClient {
    http: BotHttpClient,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    /// Build a client. Calls fail fast with [`ResearchError::Config`]
    /// when no key is configured.
    #[must_use]
    pub fn new(http: BotHttpClient, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    /// `function=EARNINGS` — quarterly and annual EPS history.
    pub async fn earnings(&self, symbol: &str) -> Result<Value, ResearchError> {
        let Some(key) = &self.api_key else {
            return Err(ResearchError::Config("ALPHA_VANTAGE_KEY not configured".to_string()));
        };
        let url = format!("{BASE_URL}?function=EARNINGS&symbol={symbol}&apikey={key}");
        self.http.get_json("alpha_vantage", &url).await
    }
}
