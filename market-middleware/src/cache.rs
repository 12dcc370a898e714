//! KV cache client over namespaced string keys (§4.1, §6.2).

use std::time::Duration;

use market_types::CacheConfig;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
#[cfg(feature = "tracing")]
use tracing::warn;

/// One cached entry: the serialised JSON value plus the instant it
/// expires, so `Get` can report whether a hit is still within its TTL
/// without relying on moka's own per-entry expiry (which we still set,
/// as a backstop eviction policy).
#[derive(Clone)]
struct Entry {
    value: serde_json::Value,
    written_at: std::time::Instant,
    ttl: Duration,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.written_at.elapsed() >= self.ttl
    }
}

/// Moka-backed cache client keyed by the system's namespaced string keys:
/// `research:<SYMBOL>`, `bot:<SYMBOL>:<BotName>`, `priority:watchlist`,
/// `universe:assets`.
///
/// Failure policy: cache errors are non-fatal. Reads that hit a
/// deserialisation problem degrade to "absent" rather than panicking;
/// callers treat an absent value as "pending" (§4.1).
pub struct CacheClient {
    inner: Cache<String, Entry>,
}

impl CacheClient {
    /// Build a cache client bounded by `config.max_entries`.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Cache::builder().max_capacity(config.max_entries).build(),
        }
    }

    /// `Get(key) -> (value, present)`. A present-but-expired entry is
    /// treated as absent; the caller (sweeper/read endpoint) decides
    /// whether to re-fetch.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.inner.get(key).await?;
        if entry.is_expired() {
            self.inner.invalidate(key).await;
            return None;
        }
        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                warn!(key, error = %_err, "cache entry failed to deserialise, treating as absent");
                None
            }
        }
    }

    /// `Set(key, value, ttl)`. Serialisation failures are logged and
    /// otherwise swallowed (the next sweep retries).
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.inner
                    .insert(
                        key.to_string(),
                        Entry {
                            value,
                            written_at: std::time::Instant::now(),
                            ttl,
                        },
                    )
                    .await;
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                warn!(key, error = %_err, "failed to serialise value for cache write");
            }
        }
    }

    /// `Exists(key) -> bool`, without deserialising the value.
    pub async fn exists(&self, key: &str) -> bool {
        self.inner.get(key).await.is_some_and(|e| !e.is_expired())
    }

    /// Remove a key outright (used when invalidating a stale per-bot entry under `force`).
    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

/// Cache key for a symbol's full research envelope.
#[must_use]
pub fn research_key(symbol: &str) -> String {
    format!("research:{symbol}")
}

/// Cache key for one bot's per-symbol section.
#[must_use]
pub fn bot_key(symbol: &str, bot_name: &str) -> String {
    format!("bot:{symbol}:{bot_name}")
}

/// Cache key for the persisted watchlist.
pub const WATCHLIST_KEY: &str = "priority:watchlist";

/// Cache key for the universe-ingestion asset list.
pub const UNIVERSE_KEY: &str = "universe:assets";

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_value() {
        let client = CacheClient::new(&CacheConfig::default());
        client.set(&research_key("AAPL"), &42u32, Duration::from_secs(60)).await;
        let got: Option<u32> = client.get(&research_key("AAPL")).await;
        assert_eq!(got, Some(42));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let client = CacheClient::new(&CacheConfig::default());
        client.set(&bot_key("AAPL", "NewsBot"), &1u32, Duration::from_millis(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let got: Option<u32> = client.get(&bot_key("AAPL", "NewsBot")).await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn exists_reports_presence() {
        let client = CacheClient::new(&CacheConfig::default());
        assert!(!client.exists(WATCHLIST_KEY).await);
        client.set(WATCHLIST_KEY, &Vec::<String>::new(), Duration::from_secs(3600)).await;
        assert!(client.exists(WATCHLIST_KEY).await);
    }
}
