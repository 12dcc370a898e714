//! FRED (Federal Reserve Economic Data) client (§6.3) — `MacroBot`'s five macro series.

use market_core::ResearchError;
use serde_json::Value;

use crate::http_client::BotHttpClient;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// The five macro series MacroBot consults.
pub const MACRO_SERIES: [&str; 5] = ["FEDFUNDS", "CPIAUCSL", "GDP", "UNRATE", "DGS10"];

/// Client for FRED's `series/observations` endpoint.
pub struct FredClient {
    http: BotHttpClient,
    api_key: Option<String>,
}

impl FredClient {
    /// Build a client. Calls fail fast with [`ResearchError::Config`]
    /// when no key is configured.
    #[must_use]
    pub fn new(http: BotHttpClient, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    /// Fetch the most recent observations for one FRED series id.
    pub async fn observations(&self, series_id: &str) -> Result<Value, ResearchError> {
        let Some(key) = &self.api_key else {
            return Err(ResearchError::Config("FRED_KEY not configured".to_string()));
        };
        let url = format!(
            "{BASE_URL}?series_id={series_id}&api_key={key}&file_type=json&sort_order=desc&limit=1"
        );
        self.http.get_json("fred", &url).await
    }
}
