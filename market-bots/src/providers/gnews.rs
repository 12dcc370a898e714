//! GNews search API client (§6.3) — headline feed for `NewsBot`.

use market_core::ResearchError;
use serde::Deserialize;

use crate::http_client::BotHttpClient;

const BASE_URL: &str = "https://gnews.io/api/v4/search";

/// One headline returned by a GNews search.
#[derive(Debug, Clone, Deserialize)]
pub struct Headline {
    /// Headline title.
    pub title: String,
    /// Short description/snippet, when present.
    #[serde(default)]
    pub description: String,
    #[serde(rename = "publishedAt")]
    #[allow(dead_code)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Headline>,
}

/// Client for the GNews search endpoint.
pub struct GNewsClient {
    http: BotHttpClient,
    api_key: Option<String>,
}

impl GNewsClient {
    /// Build a client. `api_key` absent means every call fails fast
    /// with [`ResearchError::Config`] so `NewsBot` can degrade gracefully.
    #[must_use]
    pub fn new(http: BotHttpClient, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    /// Search the last 24 hours of English-language headlines for `query`,
    /// capped at 10 results.
    pub async fn search(&self, query: &str) -> Result<Vec<Headline>, ResearchError> {
        let Some(key) = &self.api_key else {
            return Err(ResearchError::Config("GNEWS_KEY not configured".to_string()));
        };
        let url = format!(
            "{BASE_URL}?q={}&lang=en&max=10&sortby=publishedAt&apikey={key}",
            urlencoding_minimal(query)
        );
        let body = self.http.get_json("gnews", &url).await?;
        let parsed: SearchResponse =
            serde_json::from_value(body).map_err(|e| ResearchError::parse("gnews", e.to_string()))?;
        Ok(parsed.articles)
    }
}

/// Minimal query-string escaping sufficient for company names and tickers
/// (spaces and `&` are the only characters GNews queries realistically contain).
fn urlencoding_minimal(s: &str) -> String {
    s.replace(' ', "%20").replace('&', "%26")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_spaces() {
        assert_eq!(urlencoding_minimal("Apple Inc"), "Apple%20Inc");
    }
}
