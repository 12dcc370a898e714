//! Domain types shared by bots, the sweeper, and the read endpoint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Section names a `ResearchPayload.data` map may hold.
pub const SECTION_NAMES: [&str; 7] = [
    "news",
    "price",
    "technicals",
    "fundamentals",
    "analyst",
    "earnings",
    "macro",
];

/// The closed set of `signal_inputs` keys (§4.3) and their nominal ranges.
pub const SIGNAL_INPUT_KEYS: [&str; 9] = [
    "sentiment",
    "catalystNews",
    "sectorFlow",
    "revGrowth",
    "daysToEarnings",
    "insiderBuy",
    "shortInt",
    "earningsBeat",
    "debtRatio",
];

/// `quote_type` values produced by universe ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteType {
    /// Common stock.
    Equity,
    /// Exchange-traded fund.
    Etf,
    /// Cryptocurrency pair.
    Cryptocurrency,
    /// FX pair.
    Forex,
    /// Physical commodity.
    Commodity,
    /// Market index (not directly tradeable; treated as stock-like downstream).
    Index,
    /// Futures contract.
    Future,
}

/// Asset type derived at sweep time (§4.7); drives bot selection. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Ordinary equity.
    Stock,
    /// Exchange-traded fund.
    Etf,
    /// Cryptocurrency.
    Crypto,
    /// FX pair.
    Forex,
    /// Physical commodity / futures.
    Commodity,
}

/// Asset metadata produced by universe ingestion, consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Unique ticker key, e.g. `"AAPL"`, `"BTC-USD"`.
    pub ticker: String,
    /// Display name.
    pub name: String,
    /// GICS-ish sector label, lowercased where used for table lookups.
    pub sector: Option<String>,
    /// Industry label.
    pub industry: Option<String>,
    /// Listing exchange.
    pub exchange: Option<String>,
    /// Country of primary listing.
    pub country: Option<String>,
    /// Trading currency.
    pub currency: Option<String>,
    /// Quote type as published by universe ingestion.
    pub quote_type: QuoteType,
}

/// Status of one bot's contribution to a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    /// Bot ran and returned a usable result this sweep.
    Success,
    /// Bot was skipped because its per-bot cache entry was still fresh.
    Cached,
    /// Bot ran but returned an error.
    Failed,
    /// Bot was not part of the selected bot set for this sweep.
    Skipped,
}

/// Transient, per-bot-invocation result (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotResult {
    /// Name of the bot that produced this result, e.g. `"NewsBot"`.
    pub bot_name: String,
    /// Ticker this result is for.
    pub ticker: String,
    /// Numeric features keyed by the closed `signal_inputs` key set.
    #[serde(default)]
    pub signal_inputs: HashMap<String, f64>,
    /// Short bullish factor strings, most significant first.
    #[serde(default)]
    pub bull_factors: Vec<String>,
    /// Short bearish factor strings, most significant first.
    #[serde(default)]
    pub bear_factors: Vec<String>,
    /// One-line prose summary.
    #[serde(default)]
    pub summary: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Provider label, e.g. `"gnews"`.
    pub source: String,
    /// Source-specific detail block, opaque to the sweeper, consumed by the delta detector.
    #[serde(default)]
    pub raw: serde_json::Value,
    /// Present only on failure; marks this result as a failure when `Some`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BotResult {
    /// Build an empty, failed result — the canonical "bot errored" value.
    #[must_use]
    pub fn failed(bot_name: impl Into<String>, ticker: impl Into<String>, source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            ticker: ticker.into(),
            signal_inputs: HashMap::new(),
            bull_factors: Vec::new(),
            bear_factors: Vec::new(),
            summary: String::new(),
            confidence: 0.0,
            source: source.into(),
            raw: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    /// True when this result represents a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-section freshness/status bookkeeping attached to a `ResearchPayload`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchMeta {
    /// Symbol this meta describes.
    pub symbol: String,
    /// When the envelope was last written.
    pub last_updated: DateTime<Utc>,
    /// Which scheduled job (or "manual") triggered the sweep that produced this envelope.
    pub sweep_cycle: String,
    /// Per-section human-readable age string, e.g. `"5m"`, populated on read.
    #[serde(default)]
    pub freshness: HashMap<String, String>,
    /// Per-bot status for this sweep.
    #[serde(default)]
    pub bots: HashMap<String, BotStatus>,
    /// Whether the delta detector found a significant change vs. the previous envelope.
    pub delta_detected: bool,
    /// Section names whose `_fetched_at` exceeds their TTL, recomputed at read time.
    #[serde(default)]
    pub stale_fields: Vec<String>,
    /// Count of populated data points across all sections (observability only).
    pub data_points: usize,
    /// Number of bots that actually ran (not cached, not skipped) this sweep.
    pub bots_run: usize,
    /// Wall-clock duration of the sweep, in seconds.
    pub sweep_duration_s: f64,
}

/// The canonical cache record for one symbol (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPayload {
    /// Symbol this envelope is for.
    pub symbol: String,
    /// Section name → section JSON blob, each carrying `_fetched_at`/`_source`.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Deduplicated, length-capped (≤ 6) bullish factors.
    #[serde(default)]
    pub bull_factors: Vec<String>,
    /// Deduplicated, length-capped (≤ 6) bearish factors.
    #[serde(default)]
    pub bear_factors: Vec<String>,
    /// Merged numeric features, confidence-weighted across contributing bots.
    #[serde(default)]
    pub signal_inputs: HashMap<String, f64>,
    /// Metadata: freshness, bot statuses, delta flag, counts.
    pub meta: ResearchMeta,
}

impl ResearchPayload {
    /// Construct an empty envelope for a symbol with no data yet, stamped "now".
    #[must_use]
    pub fn empty(symbol: impl Into<String>, sweep_cycle: impl Into<String>, now: DateTime<Utc>) -> Self {
        let symbol = symbol.into();
        Self {
            symbol: symbol.clone(),
            data: HashMap::new(),
            bull_factors: Vec::new(),
            bear_factors: Vec::new(),
            signal_inputs: HashMap::new(),
            meta: ResearchMeta {
                symbol,
                last_updated: now,
                sweep_cycle: sweep_cycle.into(),
                freshness: HashMap::new(),
                bots: HashMap::new(),
                delta_detected: false,
                stale_fields: Vec::new(),
                data_points: 0,
                bots_run: 0,
                sweep_duration_s: 0.0,
            },
        }
    }

    /// Age of this envelope relative to `now`, in seconds.
    #[must_use]
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.meta.last_updated).num_seconds().max(0)
    }
}

/// `_served_from` discriminant returned by the read endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFreshness {
    /// Served directly from an existing, sufficiently-fresh cache entry.
    Cache,
    /// No cache entry existed; a sweep was triggered and the caller should poll again.
    Pending,
}
