//! Per-asset orchestration: bot selection, rate-limited fan-out, delta
//! detection, cache write (§4.4).

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use market_core::{
    detect_delta, is_non_us, BotResult, BotStatus, ResearchMeta, ResearchPayload,
};
use market_types::Provider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "tracing")]
use tracing::{info, instrument, warn};

use crate::engine::Engine;

/// Factor-list cap and dedup-prefix length (§3.2, §9).
const FACTOR_CAP: usize = 6;
const DEDUP_PREFIX_LEN: usize = 40;

/// What ran, was reused from cache, or was excluded, plus the raw
/// [`BotResult`] behind it — enough to build both `data` and `meta.bots`.
struct BotOutcome {
    name: &'static str,
    status: BotStatus,
    result: Option<BotResult>,
    fetched_at: chrono::DateTime<Utc>,
}

/// What a successful per-bot fetch is cached as, independent of the
/// envelope it was incorporated into (§3.2).
#[derive(Serialize, Deserialize)]
struct CachedBotEntry {
    result: BotResult,
    fetched_at: chrono::DateTime<Utc>,
}

/// The ordered, closed bot set for each `asset_type` (§4.3 "Orchestration across bots").
#[must_use]
pub fn bots_for_asset_type(asset_type: market_core::AssetType) -> &'static [&'static str] {
    use market_core::AssetType::{Commodity, Crypto, Etf, Forex, Stock};
    match asset_type {
        Stock => &[
            "NewsBot",
            "EarningsBot",
            "MacroBot",
            "InsiderBot",
            "FundamentalsBot",
            "TechnicalLevelsBot",
            "AnalystBot",
        ],
        Etf | Crypto => &["MacroBot", "NewsBot", "TechnicalLevelsBot"],
        Forex | Commodity => &["MacroBot", "TechnicalLevelsBot"],
    }
}

/// Maps a bot name to the section name its `raw` block is stored under in `data`.
///
/// `InsiderBot` writes an `"insider"` section, one beyond the distilled
/// spec's fixed seven (§3.1) — an explicit enrichment, not a fallback
/// (DESIGN.md Open-Question resolution #7). No bot in the seven
/// produces a standalone `"price"` section; `TechnicalLevelsBot`
/// carries the current price inside `"technicals".raw.current`.
pub(crate) fn section_name(bot_name: &str) -> &'static str {
    match bot_name {
        "NewsBot" => "news",
        "EarningsBot" => "earnings",
        "MacroBot" => "macro",
        "FundamentalsBot" => "fundamentals",
        "AnalystBot" => "analyst",
        "TechnicalLevelsBot" => "technicals",
        "InsiderBot" => "insider",
        other => other,
    }
}

/// Inverse of [`section_name`], used by the read endpoint to look up
/// the owning bot's `cache_ttl` when computing `stale_fields` at read
/// time (§4.6, §9's per-bot-TTL resolution).
pub(crate) fn bot_name_for_section(section: &str) -> Option<&'static str> {
    match section {
        "news" => Some("NewsBot"),
        "earnings" => Some("EarningsBot"),
        "macro" => Some("MacroBot"),
        "fundamentals" => Some("FundamentalsBot"),
        "analyst" => Some("AnalystBot"),
        "technicals" => Some("TechnicalLevelsBot"),
        "insider" => Some("InsiderBot"),
        _ => None,
    }
}

/// The single provider a bot's fetch will hit for `ticker` this sweep,
/// used to acquire exactly one rate-limiter token before calling
/// `fetch` (§4.2, §4.3's "framework wraps Fetch with ... rate-limiter
/// acquisition"). Multi-provider bots route by region the same way
/// their own fallback chain does (§4.3), so this never under- or
/// over-acquires relative to the HTTP call the bot actually makes.
fn primary_provider(bot_name: &str, ticker: &str) -> Provider {
    let non_us = is_non_us(ticker);
    match bot_name {
        "NewsBot" => Provider::GNews,
        "EarningsBot" => {
            if non_us {
                Provider::Fmp
            } else {
                Provider::Yahoo
            }
        }
        "MacroBot" => Provider::Fred,
        "InsiderBot" => Provider::SecEdgar,
        "FundamentalsBot" => Provider::Fmp,
        "TechnicalLevelsBot" => {
            if non_us {
                Provider::Yahoo
            } else {
                Provider::Polygon
            }
        }
        "AnalystBot" => Provider::Fmp,
        _ => Provider::Yahoo,
    }
}

/// Inputs that vary a sweep beyond "just refresh this symbol" (§4.4, §4.9).
#[derive(Debug, Clone, Default)]
pub struct SweepRequest {
    /// Which scheduled job (or `"manual"`) asked for this sweep; stamped into `meta.sweep_cycle`.
    pub cycle: String,
    /// Bypass per-bot cache reuse and re-fetch everything selected.
    pub force: bool,
    /// Bots to run first, when present (does not exclude the rest of the asset-type set).
    pub priority_bots: Option<Vec<String>>,
    /// When present, only these bots run (intersected with the asset-type set); implies `force`.
    pub bots_override: Option<Vec<String>>,
}

/// Sweep one asset: fan out its applicable bots, merge their results,
/// detect a delta against the previous envelope, and write the new one.
///
/// Always returns a [`ResearchPayload`] — even when every bot fails,
/// per §4.4's failure semantics, so the read endpoint never serves
/// "pending" indefinitely for a symbol that has actually been swept.
#[cfg_attr(feature = "tracing", instrument(skip(engine, req), fields(symbol, cycle = %req.cycle)))]
pub async fn sweep_asset(
    engine: &Engine,
    symbol: &str,
    asset: &market_core::AssetMeta,
    req: SweepRequest,
) -> ResearchPayload {
    let start = Instant::now();
    let _permit = engine.sweep_limiter.acquire().await;

    let asset_type = market_core::derive_asset_type(symbol, asset.quote_type, asset.sector.as_deref());
    let available = bots_for_asset_type(asset_type);

    let force = req.force || req.bots_override.is_some();

    let selected: Vec<&'static str> = if let Some(overrides) = &req.bots_override {
        let wanted: HashSet<&str> = overrides.iter().map(String::as_str).collect();
        available.iter().copied().filter(|b| wanted.contains(b)).collect()
    } else {
        let mut ordered: Vec<&'static str> = available.to_vec();
        if let Some(priority) = &req.priority_bots {
            ordered.sort_by_key(|b| priority.iter().position(|p| p == b).unwrap_or(usize::MAX));
        }
        ordered
    };
    let selected_set: HashSet<&str> = selected.iter().copied().collect();

    let research_key = market_middleware::research_key(symbol);
    let previous: Option<ResearchPayload> = engine.cache.get(&research_key).await;

    let mut to_run = Vec::new();
    let mut outcomes: Vec<BotOutcome> = Vec::new();
    let now = Utc::now();

    for &name in &selected {
        let bot_key = market_middleware::bot_key(symbol, name);
        let cached: Option<CachedBotEntry> = if force { None } else { engine.cache.get(&bot_key).await };
        if let Some(entry) = cached {
            outcomes.push(BotOutcome {
                name,
                status: BotStatus::Cached,
                result: Some(entry.result),
                fetched_at: entry.fetched_at,
            });
        } else {
            to_run.push(name);
        }
    }

    let bots_run = to_run.len();
    let fetches = to_run.into_iter().map(|name| async move {
        let Some(bot) = engine.bot(name) else {
            return (name, BotResult::failed(name, symbol, "registry", "bot not registered"));
        };
        engine
            .rate_limiter
            .acquire(primary_provider(name, symbol), 1)
            .await;
        let result = bot.fetch(symbol, asset).await;
        (name, result)
    });
    let fetched: Vec<(&'static str, BotResult)> = futures::future::join_all(fetches).await;

    for (name, result) in fetched {
        if !result.is_failure() {
            let entry = CachedBotEntry { result: result.clone(), fetched_at: now };
            if let Some(bot) = engine.bot(name) {
                engine.cache.set(&market_middleware::bot_key(symbol, name), &entry, bot.cache_ttl()).await;
            }
        } else {
            #[cfg(feature = "tracing")]
            warn!(symbol, bot = name, error = ?result.error, "bot fetch failed");
        }
        let status = if result.is_failure() { BotStatus::Failed } else { BotStatus::Success };
        outcomes.push(BotOutcome { name, status, result: Some(result), fetched_at: now });
    }

    for &name in available {
        if !selected_set.contains(name) {
            outcomes.push(BotOutcome { name, status: BotStatus::Skipped, result: None, fetched_at: now });
        }
    }

    let (data, signal_inputs, mut bull_factors, bear_factors) = assemble(&outcomes);

    // Every selected bot failed and nothing was served from a per-bot
    // cache hit: the envelope would otherwise carry zero factors,
    // which reads to a viewer as "we have nothing" rather than "we're
    // still warming up" (§4.4 failure semantics, §8 scenario 2).
    if data.is_empty() && bull_factors.is_empty() && !selected.is_empty() {
        bull_factors.push("Research bots loading — signals stabilising".to_string());
    }

    let old_data = previous.as_ref().map_or_else(HashMap::new, |p| p.data.clone());
    let delta_detected = detect_delta(&old_data, &data);

    let mut bots_status = HashMap::new();
    for outcome in &outcomes {
        bots_status.insert(outcome.name.to_string(), outcome.status);
    }

    let data_points = count_data_points(&outcomes);

    let payload = ResearchPayload {
        symbol: symbol.to_string(),
        data,
        bull_factors,
        bear_factors,
        signal_inputs,
        meta: ResearchMeta {
            symbol: symbol.to_string(),
            last_updated: now,
            sweep_cycle: req.cycle,
            freshness: HashMap::new(),
            bots: bots_status,
            delta_detected,
            stale_fields: Vec::new(),
            data_points,
            bots_run,
            sweep_duration_s: start.elapsed().as_secs_f64(),
        },
    };

    engine.cache.set(&research_key, &payload, engine.config.result_ttl).await;

    #[cfg(feature = "tracing")]
    info!(symbol, bots_run, delta_detected, duration_s = payload.meta.sweep_duration_s, "swept asset");

    payload
}

fn assemble(outcomes: &[BotOutcome]) -> (HashMap<String, Value>, HashMap<String, f64>, Vec<String>, Vec<String>) {
    let mut data = HashMap::new();
    let mut weighted_sums: HashMap<String, f64> = HashMap::new();
    let mut weight_totals: HashMap<String, f64> = HashMap::new();
    let mut first_values: HashMap<String, f64> = HashMap::new();
    let mut bull = Vec::new();
    let mut bear = Vec::new();

    for outcome in outcomes {
        let Some(result) = &outcome.result else { continue };
        if result.is_failure() {
            continue;
        }

        let mut section = result.raw.clone();
        if let Value::Object(map) = &mut section {
            map.insert("_fetched_at".to_string(), Value::String(outcome.fetched_at.to_rfc3339()));
            map.insert("_source".to_string(), Value::String(result.source.clone()));
        } else {
            section = serde_json::json!({
                "value": section,
                "_fetched_at": outcome.fetched_at.to_rfc3339(),
                "_source": result.source,
            });
        }
        data.insert(section_name(outcome.name).to_string(), section);

        for (key, value) in &result.signal_inputs {
            first_values.entry(key.clone()).or_insert(*value);
            *weighted_sums.entry(key.clone()).or_insert(0.0) += value * result.confidence;
            *weight_totals.entry(key.clone()).or_insert(0.0) += result.confidence;
        }

        bull.extend(result.bull_factors.iter().cloned());
        bear.extend(result.bear_factors.iter().cloned());
    }

    let mut signal_inputs = HashMap::new();
    for (key, total_weight) in &weight_totals {
        let merged = if *total_weight > 0.0 {
            weighted_sums[key] / total_weight
        } else {
            first_values[key]
        };
        signal_inputs.insert(key.clone(), round3(merged));
    }

    (data, signal_inputs, dedupe(bull), dedupe(bear))
}

/// Dedup by case-folded 40-char prefix, cap at 6 (§3.2).
fn dedupe(factors: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for factor in factors {
        let key: String = factor.to_lowercase().chars().take(DEDUP_PREFIX_LEN).collect();
        if seen.insert(key) {
            out.push(factor);
        }
        if out.len() >= FACTOR_CAP {
            break;
        }
    }
    out
}

/// `meta.data_points` (§3.3): signal-input count for freshly-run bots,
/// non-`_`-prefixed raw-field count for cache-reused ones. Failed and
/// skipped bots contribute nothing.
fn count_data_points(outcomes: &[BotOutcome]) -> usize {
    outcomes
        .iter()
        .filter_map(|outcome| {
            let result = outcome.result.as_ref()?;
            if result.is_failure() {
                return None;
            }
            Some(match outcome.status {
                BotStatus::Success => result.signal_inputs.len(),
                BotStatus::Cached => non_underscore_field_count(&result.raw),
                BotStatus::Failed | BotStatus::Skipped => 0,
            })
        })
        .sum()
}

/// Count of `value`'s top-level keys that do not start with `_`
/// (mirrors excluding the injected `_fetched_at`/`_source` meta keys).
fn non_underscore_field_count(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.keys().filter(|k| !k.starts_with('_')).count(),
        Value::Array(arr) => arr.len(),
        Value::Null => 0,
        _ => 1,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{AssetMeta, QuoteType};
    use market_mock::all_mock_bots;
    use market_types::EngineConfig;

    fn asset(ticker: &str) -> AssetMeta {
        AssetMeta {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            sector: None,
            industry: None,
            exchange: None,
            country: None,
            currency: None,
            quote_type: QuoteType::Equity,
        }
    }

    fn test_engine() -> Engine {
        Engine::new(EngineConfig { result_ttl: std::time::Duration::from_secs(7200), ..EngineConfig::default() }, all_mock_bots())
    }

    #[tokio::test]
    async fn stock_runs_all_seven_bots() {
        let engine = test_engine();
        let payload = sweep_asset(&engine, "AAPL", &asset("AAPL"), SweepRequest { cycle: "manual".into(), ..Default::default() }).await;
        assert_eq!(payload.meta.bots.len(), 7);
        assert_eq!(payload.meta.bots_run, 7);
    }

    #[tokio::test]
    async fn crypto_runs_exactly_three_bots() {
        let engine = test_engine();
        let payload = sweep_asset(&engine, "BTC-USD", &asset("BTC-USD"), SweepRequest { cycle: "manual".into(), ..Default::default() }).await;
        assert_eq!(payload.meta.bots.len(), 3);
        assert!(payload.meta.bots.contains_key("MacroBot"));
        assert!(payload.meta.bots.contains_key("NewsBot"));
        assert!(payload.meta.bots.contains_key("TechnicalLevelsBot"));
        assert!(!payload.meta.bots.contains_key("FundamentalsBot"));
        assert!(!payload.meta.bots.contains_key("InsiderBot"));
    }

    #[tokio::test]
    async fn all_bots_failing_still_writes_envelope() {
        let engine = test_engine();
        let payload = sweep_asset(&engine, "FAIL", &asset("FAIL"), SweepRequest { cycle: "manual".into(), ..Default::default() }).await;
        assert!(payload.data.is_empty());
        assert!(payload.meta.bots.values().all(|s| matches!(s, BotStatus::Failed)));
        assert_eq!(payload.bull_factors, vec!["Research bots loading — signals stabilising".to_string()]);
    }

    #[tokio::test]
    async fn second_identical_sweep_has_no_delta_but_bumps_last_updated() {
        let engine = test_engine();
        let first = sweep_asset(&engine, "MSFT", &asset("MSFT"), SweepRequest { cycle: "manual".into(), force: true, ..Default::default() }).await;
        let second = sweep_asset(&engine, "MSFT", &asset("MSFT"), SweepRequest { cycle: "manual".into(), force: true, ..Default::default() }).await;
        assert!(!second.meta.delta_detected);
        assert!(second.meta.last_updated >= first.meta.last_updated);
    }

    #[tokio::test]
    async fn bots_override_runs_only_the_intersection() {
        let engine = test_engine();
        let payload = sweep_asset(
            &engine,
            "AAPL",
            &asset("AAPL"),
            SweepRequest {
                cycle: "overnight".into(),
                bots_override: Some(vec!["NewsBot".to_string(), "EarningsBot".to_string()]),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(payload.meta.bots.get("NewsBot"), Some(&BotStatus::Success));
        assert_eq!(payload.meta.bots.get("EarningsBot"), Some(&BotStatus::Success));
        assert_eq!(payload.meta.bots.get("MacroBot"), Some(&BotStatus::Skipped));
    }

    #[tokio::test]
    async fn factor_lists_are_capped_and_deduped() {
        let factors = vec![
            "Same catalyst headline repeated with slightly different trailing text A".to_string(),
            "Same catalyst headline repeated with slightly different trailing text B".to_string(),
            "Unrelated factor".to_string(),
        ];
        let out = dedupe(factors);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn data_points_counts_signal_inputs_fresh_and_raw_fields_cached() {
        let fresh = BotOutcome {
            name: "NewsBot",
            status: BotStatus::Success,
            result: Some(BotResult {
                bot_name: "NewsBot".to_string(),
                ticker: "AAPL".to_string(),
                signal_inputs: [("sentiment".to_string(), 0.5), ("catalystNews".to_string(), 0.1)].into_iter().collect(),
                bull_factors: vec![],
                bear_factors: vec![],
                summary: String::new(),
                confidence: 0.6,
                source: "mock".to_string(),
                raw: serde_json::json!({"headlines": ["a", "b", "c"]}),
                error: None,
            }),
            fetched_at: Utc::now(),
        };
        let cached = BotOutcome {
            name: "MacroBot",
            status: BotStatus::Cached,
            result: Some(BotResult {
                bot_name: "MacroBot".to_string(),
                ticker: "AAPL".to_string(),
                signal_inputs: HashMap::new(),
                bull_factors: vec![],
                bear_factors: vec![],
                summary: String::new(),
                confidence: 0.7,
                source: "mock".to_string(),
                raw: serde_json::json!({"sector_flow": 0.2, "_fetched_at": "x", "_source": "fred"}),
                error: None,
            }),
            fetched_at: Utc::now(),
        };
        let failed = BotOutcome {
            name: "InsiderBot",
            status: BotStatus::Failed,
            result: Some(BotResult::failed("InsiderBot", "AAPL", "mock", "down")),
            fetched_at: Utc::now(),
        };
        // 2 signal inputs from the fresh bot, 1 non-underscore field from the
        // cached bot's raw block (`_fetched_at`/`_source` excluded), nothing
        // from the failed bot.
        assert_eq!(count_data_points(&[fresh, cached, failed]), 3);
    }
}

#[cfg(test)]
mod dedupe_props {
    use super::dedupe;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn never_exceeds_the_cap(factors in proptest::collection::vec(".{0,80}", 0..40)) {
            prop_assert!(dedupe(factors).len() <= 6);
        }

        #[test]
        fn is_idempotent(factors in proptest::collection::vec(".{0,80}", 0..40)) {
            let once = dedupe(factors);
            let twice = dedupe(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
