//! SEC EDGAR full-text search client (§6.3) — `InsiderBot`'s Form 4 feed.

use chrono::{Duration as ChronoDuration, Utc};
use market_core::ResearchError;
use serde_json::Value;

use crate::http_client::BotHttpClient;

const BASE_URL: &str = "https://efts.sec.gov/LATEST/search-index";

/// Client for EDGAR's full-text search index, scoped to Form 4 filings.
pub struct SecEdgarClient {
    http: BotHttpClient,
}

impl SecEdgarClient {
    /// Build a client. EDGAR full-text search requires no API key.
    #[must_use]
    pub fn new(http: BotHttpClient) -> Self {
        Self { http }
    }

    /// Search Form 4 filings mentioning `ticker` over the last 90 days.
    pub async fn search_form4(&self, ticker: &str) -> Result<Value, ResearchError> {
        let today = Utc::now().date_naive();
        let start = today - ChronoDuration::days(90);
        let url = format!(
            "{BASE_URL}?q={ticker}&forms=4&dateRange=custom&startdt={start}&enddt={today}"
        );
        self.http.get_json("sec_edgar", &url).await
    }
}
