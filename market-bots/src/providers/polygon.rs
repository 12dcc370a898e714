//! Polygon.io client (§6.3) — US-ticker OHLCV history for `TechnicalLevelsBot`.

use chrono::{Duration as ChronoDuration, Utc};
use market_core::ResearchError;
use serde_json::Value;

use crate::http_client::BotHttpClient;

const BASE_URL: &str = "https://api.polygon.io";

/// Client for Polygon's aggregates endpoint.
pub struct PolygonClient {
    http: BotHttpClient,
    api_key: Option<String>,
}

impl PolygonClient {
    /// Build a client. Calls fail fast with [`ResearchError::Config`]
    /// when no key is configured.
    #[must_use]
    pub fn new(http: BotHttpClient, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    /// `GET /v2/aggs/ticker/{symbol}/range/1/day/{from}/{to}` — up to
    /// one year of daily OHLCV bars, most recent last.
    pub async fn daily_aggregates(&self, symbol: &str) -> Result<Value, ResearchError> {
        let Some(key) = &self.api_key else {
            return Err(ResearchError::Config("POLYGON_KEY not configured".to_string()));
        };
        let today = Utc::now().date_naive();
        let a_year_ago = today - ChronoDuration::days(365);
        let url = format!(
            "{BASE_URL}/v2/aggs/ticker/{symbol}/range/1/day/{a_year_ago}/{today}?adjusted=true&sort=asc&limit=365&apiKey={key}"
        );
        self.http.get_json("polygon", &url).await
    }
}
