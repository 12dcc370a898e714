//! Configuration types shared across the sweeper, scheduler, and bots.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token-bucket parameters for a single external data provider.
///
/// Mirrors the provider table from the orchestrator's rate limiter:
/// capacity is the maximum burst, `refill_per_second` is chosen to
/// respect the provider's strictest published daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderRateLimit {
    /// Maximum number of tokens the bucket can hold.
    pub capacity: f64,
    /// Tokens added back per second of wall-clock time.
    pub refill_per_second: f64,
}

impl ProviderRateLimit {
    /// Construct a new rate limit descriptor.
    #[must_use]
    pub const fn new(capacity: f64, refill_per_second: f64) -> Self {
        Self {
            capacity,
            refill_per_second,
        }
    }
}

/// External data providers consulted by the bot fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// GNews search API (news headlines).
    GNews,
    /// Financial Modeling Prep (earnings, fundamentals, analyst data).
    Fmp,
    /// Alpha Vantage (earnings fallback).
    AlphaVantage,
    /// Polygon.io (OHLCV history).
    Polygon,
    /// FRED (macro series).
    Fred,
    /// Yahoo Finance (fallback for most capabilities).
    Yahoo,
    /// SEC EDGAR full-text search (Form 4 insider filings).
    SecEdgar,
}

impl Provider {
    /// Stable lowercase name, matching the orchestrator's bucket keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GNews => "gnews",
            Self::Fmp => "fmp",
            Self::AlphaVantage => "alpha_vantage",
            Self::Polygon => "polygon",
            Self::Fred => "fred",
            Self::Yahoo => "yahoo",
            Self::SecEdgar => "sec_edgar",
        }
    }

    /// All providers the rate limiter must seed buckets for at startup.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::GNews,
            Self::Fmp,
            Self::AlphaVantage,
            Self::Polygon,
            Self::Fred,
            Self::Yahoo,
            Self::SecEdgar,
        ]
    }

    /// Default token-bucket parameters for this provider.
    ///
    /// Values reproduce the orchestrator's `_PROVIDER_CONFIG` table.
    /// `SecEdgar` has no published daily cap in that table; it is given
    /// a conservative bucket (generous burst, slow refill) so InsiderBot
    /// does not hammer EDGAR during bulk sweeps.
    #[must_use]
    pub const fn default_limit(self) -> ProviderRateLimit {
        match self {
            Self::GNews => ProviderRateLimit::new(3.0, 1.0 / 864.0),
            Self::Fmp => ProviderRateLimit::new(5.0, 1.0 / 288.0),
            Self::AlphaVantage => ProviderRateLimit::new(2.0, 1.0 / 3456.0),
            Self::Polygon => ProviderRateLimit::new(5.0, 1.0 / 12.0),
            Self::Fred => ProviderRateLimit::new(10.0, 0.5),
            Self::Yahoo => ProviderRateLimit::new(5.0, 1.0 / 3.0),
            Self::SecEdgar => ProviderRateLimit::new(5.0, 1.0 / 60.0),
        }
    }
}

/// API keys and tuning knobs recognised from the environment (§6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL this instance's own HTTP surface is reachable at (informational).
    pub mb_api_url: Option<String>,
    /// Cache backing store connection string (e.g. a Redis URL). When
    /// absent the in-process cache client is used standalone.
    pub redis_url: Option<String>,
    /// GNews API key; `NewsBot` degrades gracefully when absent.
    pub gnews_key: Option<String>,
    /// Financial Modeling Prep API key.
    pub fmp_key: Option<String>,
    /// Alpha Vantage API key.
    pub alpha_vantage_key: Option<String>,
    /// Polygon.io API key.
    pub polygon_key: Option<String>,
    /// FRED API key.
    pub fred_key: Option<String>,
    /// Maximum number of assets swept concurrently (the sweep semaphore).
    pub max_concurrent_sweeps: usize,
    /// Pause between consecutive assets within one scheduled job.
    pub sweep_inter_asset_pause: Duration,
    /// Envelope TTL for `research:<SYMBOL>` cache entries.
    pub result_ttl: Duration,
    /// Socket address the HTTP surface binds to.
    pub bind_addr: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mb_api_url: None,
            redis_url: None,
            gnews_key: None,
            fmp_key: None,
            alpha_vantage_key: None,
            polygon_key: None,
            fred_key: None,
            max_concurrent_sweeps: 3,
            sweep_inter_asset_pause: Duration::from_millis(300),
            result_ttl: Duration::from_secs(7200),
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// the documented defaults for anything unset or unparsable.
    ///
    /// Missing provider API keys are not an error: the owning bot
    /// disables itself and reports an explanatory error in its result
    /// rather than failing engine startup.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mb_api_url: std::env::var("MB_API_URL").ok(),
            redis_url: std::env::var("REDIS_URL").ok(),
            gnews_key: std::env::var("GNEWS_KEY").ok(),
            fmp_key: std::env::var("FMP_KEY").ok(),
            alpha_vantage_key: std::env::var("ALPHA_VANTAGE_KEY").ok(),
            polygon_key: std::env::var("POLYGON_KEY").ok(),
            fred_key: std::env::var("FRED_KEY").ok(),
            max_concurrent_sweeps: std::env::var("MAX_CONCURRENT_SWEEPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrent_sweeps),
            sweep_inter_asset_pause: std::env::var("SWEEP_INTER_ASSET_PAUSE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.sweep_inter_asset_pause, Duration::from_millis),
            result_ttl: std::env::var("RESULT_TTL_S")
                .ok()
                .and_then(|v| v.parse().ok())
                .map_or(defaults.result_ttl, Duration::from_secs),
            bind_addr: std::env::var("MB_BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}

/// Configuration for the moka-backed cache client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries retained across all namespaces.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 100_000 }
    }
}
