//! Shared HTTP client wrapper used by every provider module.
//!
//! Centralises the retry/back-off/timeout policy from §5 and §7 so
//! individual provider clients only deal with URLs and payload shapes:
//! a 10-second per-request timeout, up to 3 attempts with linear
//! back-off, and a doubled wait whenever a provider answers 429.

use std::time::Duration;

use market_core::ResearchError;
use reqwest::{Client, StatusCode};
use serde_json::Value;
#[cfg(feature = "tracing")]
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Thin wrapper around a [`reqwest::Client`] shared by all provider clients.
#[derive(Clone)]
pub struct BotHttpClient {
    client: Client,
}

impl Default for BotHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BotHttpClient {
    /// Build a client with the workspace-wide request timeout.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }

    /// Access the underlying [`reqwest::Client`] for requests that need
    /// bespoke headers or query building beyond [`Self::get_json`].
    #[must_use]
    pub const fn raw(&self) -> &Client {
        &self.client
    }

    /// `GET url`, retrying transient failures, and parse the body as JSON.
    ///
    /// Retries up to [`MAX_ATTEMPTS`] times with linear back-off
    /// (`attempt * BASE_BACKOFF`); a 429 response doubles the wait
    /// before the next attempt. Auth/quota rejections (401/403) and
    /// non-2xx/429 client errors do not retry. Every failure mode
    /// becomes a [`ResearchError`] for the calling bot to turn into an
    /// empty [`market_core::BotResult`].
    pub async fn get_json(&self, provider: &str, url: &str) -> Result<Value, ResearchError> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(ResearchError::quota(provider, format!("rejected with {status}")));
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_err = Some(ResearchError::provider(provider, "rate limited (429)"));
                        #[cfg(feature = "tracing")]
                        warn!(provider, attempt, "provider returned 429, doubling back-off");
                        tokio::time::sleep(BASE_BACKOFF * attempt * 2).await;
                        continue;
                    }
                    if !status.is_success() {
                        last_err = Some(ResearchError::provider(provider, format!("HTTP {status}")));
                        tokio::time::sleep(BASE_BACKOFF * attempt).await;
                        continue;
                    }
                    return resp
                        .json::<Value>()
                        .await
                        .map_err(|e| ResearchError::parse(provider, e.to_string()));
                }
                Err(e) if e.is_timeout() => {
                    last_err = Some(ResearchError::timeout(provider.to_string(), attempt));
                    tokio::time::sleep(BASE_BACKOFF * attempt).await;
                }
                Err(e) => {
                    last_err = Some(ResearchError::provider(provider, e.to_string()));
                    tokio::time::sleep(BASE_BACKOFF * attempt).await;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ResearchError::provider(provider, "exhausted retries")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/ok");
            then.status(200).json_body(serde_json::json!({"hello": "world"}));
        });
        let client = BotHttpClient::new();
        let body = client.get_json("test", &server.url("/ok")).await.unwrap();
        assert_eq!(body["hello"], "world");
        mock.assert();
    }

    #[tokio::test]
    async fn retries_a_500_then_succeeds() {
        let server = MockServer::start();
        let fail_then_ok = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/flaky");
            then.status(500);
        });
        let client = BotHttpClient::new();
        let result = client.get_json("test", &server.url("/flaky")).await;
        assert!(result.is_err());
        assert_eq!(fail_then_ok.hits(), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn auth_rejection_does_not_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/denied");
            then.status(401);
        });
        let client = BotHttpClient::new();
        let result = client.get_json("test", &server.url("/denied")).await;
        assert!(matches!(result, Err(ResearchError::Quota { .. })));
        assert_eq!(mock.hits(), 1);
    }
}
