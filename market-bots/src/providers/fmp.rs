//! Financial Modeling Prep client (§6.3) — earnings, fundamentals, analyst data.

use market_core::ResearchError;
use serde_json::Value;

use crate::http_client::BotHttpClient;

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Client for the FMP REST API.
pub struct FmpClient {
    http: BotHttpClient,
    api_key: Option<String>,
}

impl FmpClient {
    /// Build a client. Every call fails fast with
    /// [`ResearchError::Config`] when no key is configured.
    #[must_use]
    pub fn new(http: BotHttpClient, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    fn key(&self) -> Result<&str, ResearchError> {
        self.api_key.as_deref().ok_or_else(|| ResearchError::Config("FMP_KEY not configured".to_string()))
    }

    async fn get(&self, path: &str, symbol: &str) -> Result<Value, ResearchError> {
        let key = self.key()?;
        let url = format!("{BASE_URL}/{path}/{symbol}?apikey={key}");
        self.http.get_json("fmp", &url).await
    }

    /// `GET /earning_calendar` filtered client-side to `symbol`'s next date.
    pub async fn earnings_calendar(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("earning_calendar", symbol).await
    }

    /// `GET /earnings-surprises/{symbol}` — last several quarters of EPS surprise.
    pub async fn earnings_surprises(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("earnings-surprises", symbol).await
    }

    /// `GET /key-metrics-ttm/{symbol}` — trailing-twelve-month fundamentals.
    pub async fn key_metrics_ttm(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("key-metrics-ttm", symbol).await
    }

    /// `GET /financial-growth/{symbol}` — revenue/earnings growth series.
    pub async fn financial_growth(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("financial-growth", symbol).await
    }

    /// `GET /analyst-stock-recommendations/{symbol}` — buy/hold/sell counts.
    pub async fn analyst_recommendations(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("analyst-stock-recommendations", symbol).await
    }

    /// `GET /price-target/{symbol}` — consensus target price.
    pub async fn price_target(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("price-target", symbol).await
    }

    /// `GET /upgrades-downgrades/{symbol}` — recent rating changes.
    pub async fn upgrades_downgrades(&self, symbol: &str) -> Result<Value, ResearchError> {
        self.get("upgrades-downgrades", symbol).await
    }
}
