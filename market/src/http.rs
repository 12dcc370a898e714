//! The read-only HTTP surface (§4.10, §6.1): cache-only `/research`
//! reads with opportunistic background refresh, plus the two admin
//! endpoints. Grounded on the reference `research_engine/api/research_endpoint.py`
//! (`get_research_response`, `_trigger_background_sweep`, `_pending_response`)
//! and `scheduler.py`'s `get_scheduler_status`/`trigger_sweep_now`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use market_core::{DataFreshness, ResearchPayload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
#[cfg(feature = "tracing")]
use tracing::info;

use crate::engine::Engine;
use crate::scheduler::Scheduler;
use crate::sweeper::{bot_name_for_section, sweep_asset, SweepRequest};
use crate::universe::{asset_or_default, load_universe};

/// Fraction of `RESULT_TTL` past which a still-fresh-enough envelope
/// also triggers a background refresh (§4.10).
const REFRESH_THRESHOLD: f64 = 0.75;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The engine: cache, rate limiter, priority manager, bot registry.
    pub engine: Arc<Engine>,
    /// The running scheduler, for `/admin/scheduler` status.
    pub scheduler: Arc<Scheduler>,
}

/// Build the axum router: the read endpoint plus the two admin routes (§6.1).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/research", get(get_research))
        .route("/admin/sweep", post(admin_sweep))
        .route("/admin/scheduler", get(admin_scheduler_status))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ResearchQuery {
    symbol: String,
}

/// `GET /research?symbol=X` (§4.10, §6.1). Always returns HTTP 200; the
/// body's `_served_from` field distinguishes a cache hit from a
/// freshly-triggered pending sweep.
async fn get_research(State(state): State<AppState>, Query(query): Query<ResearchQuery>) -> impl IntoResponse {
    let symbol = query.symbol.to_uppercase();
    state.engine.priority.record_view(&symbol);

    let key = market_middleware::research_key(&symbol);
    let cached: Option<ResearchPayload> = state.engine.cache.get(&key).await;

    let Some(mut payload) = cached else {
        #[cfg(feature = "tracing")]
        info!(symbol, "cache miss — triggering fallback sweep");
        maybe_trigger_refresh(&state.engine, &symbol).await;
        return Json(pending_response(&symbol));
    };

    let now = Utc::now();
    payload.meta.stale_fields = compute_stale_fields(&payload, now);
    let age_s = payload.age_seconds(now);

    let result_ttl_s = state.engine.config.result_ttl.as_secs_f64();
    let mut body = serde_json::to_value(&payload).unwrap_or_else(|_| json!({}));
    let obj = body.as_object_mut().expect("ResearchPayload serialises to a JSON object");
    obj.insert("_served_from".to_string(), json!(DataFreshness::Cache));
    obj.insert("_age_s".to_string(), json!(age_s));

    if age_s as f64 > result_ttl_s * REFRESH_THRESHOLD && maybe_trigger_refresh(&state.engine, &symbol).await {
        obj.insert("_refreshing".to_string(), json!(true));
    }

    Json(body)
}

/// Attempt to claim `symbol` for a background refresh and, if this
/// caller won the race, spawn the one-shot sweep without blocking the
/// response (§4.10's in-flight dedup set).
async fn maybe_trigger_refresh(engine: &Arc<Engine>, symbol: &str) -> bool {
    if !engine.try_claim_refresh(symbol).await {
        return false;
    }
    let engine = engine.clone();
    let symbol = symbol.to_string();
    tokio::spawn(async move {
        let universe = load_universe(&engine).await;
        let asset = asset_or_default(&universe, &symbol);
        sweep_asset(&engine, &symbol, &asset, SweepRequest { cycle: "on_demand".to_string(), ..Default::default() }).await;
        engine.release_refresh(&symbol).await;
    });
    true
}

/// Recompute `stale_fields` against the current clock, using each
/// section's owning bot's `cache_ttl` (§4.6, §9) — writers stamp
/// `_fetched_at` and move on; readers decide staleness.
fn compute_stale_fields(payload: &ResearchPayload, now: chrono::DateTime<Utc>) -> Vec<String> {
    market_core::compute_stale_fields(&payload.data, |section| bot_name_for_section(section).and(section_ttl(section)), now)
}

/// Per-section TTL table (§3.3), mirroring each bot's `CacheTTL`.
fn section_ttl(section: &str) -> Option<std::time::Duration> {
    use std::time::Duration;
    match section {
        "news" => Some(Duration::from_secs(2 * 3600)),
        "earnings" | "fundamentals" | "analyst" => Some(Duration::from_secs(4 * 3600)),
        "macro" => Some(Duration::from_secs(3600)),
        "technicals" => Some(Duration::from_secs(3600)),
        "insider" => Some(Duration::from_secs(21_600)),
        _ => None,
    }
}

/// Build the well-formed "no cache entry yet" response (§4.10).
fn pending_response(symbol: &str) -> Value {
    json!({
        "symbol": symbol,
        "data": {},
        "bull_factors": [],
        "bear_factors": [],
        "signal_inputs": {},
        "meta": {
            "symbol": symbol,
            "last_updated": Value::Null,
            "sweep_cycle": "pending",
            "freshness": {},
            "bots": {},
            "delta_detected": false,
            "stale_fields": [],
            "data_points": 0,
            "bots_run": 0,
            "sweep_duration_s": 0,
        },
        "_served_from": DataFreshness::Pending,
        "_message": "Research sweep triggered. Data will be available within 30 seconds.",
    })
}

#[derive(Debug, Deserialize)]
struct SweepQuery {
    tier: Option<u8>,
}

#[derive(Debug, Serialize)]
struct SweepTriggered {
    triggered: bool,
    assets: usize,
    cycle: String,
}

/// `POST /admin/sweep?tier=N` (§6.1, §4.9's `TriggerSweepNow`).
async fn admin_sweep(State(state): State<AppState>, Query(query): Query<SweepQuery>) -> impl IntoResponse {
    let tier = query.tier.unwrap_or(1);
    let cycle = "manual".to_string();
    let assets = crate::scheduler::trigger_sweep_now(state.engine.clone(), tier, cycle.clone());
    #[cfg(feature = "tracing")]
    info!(tier, assets, "admin sweep triggered");
    Json(SweepTriggered { triggered: true, assets, cycle })
}

#[derive(Debug, Serialize)]
struct SchedulerStatusResponse {
    running: bool,
    job_count: usize,
    jobs: Vec<JobStatusJson>,
    mb_api_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct JobStatusJson {
    id: &'static str,
    name: &'static str,
    next_run: Option<chrono::DateTime<Utc>>,
}

/// `GET /admin/scheduler` (§6.1).
async fn admin_scheduler_status(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = state.scheduler.status().await;
    let job_count = jobs.len();
    Json(SchedulerStatusResponse {
        running: true,
        job_count,
        jobs: jobs.into_iter().map(|j| JobStatusJson { id: j.id, name: j.name, next_run: j.next_run }).collect(),
        mb_api_url: state.engine.config.mb_api_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_mock::all_mock_bots;
    use market_types::EngineConfig;

    fn test_engine() -> Arc<Engine> {
        Arc::new(Engine::new(EngineConfig::default(), all_mock_bots()))
    }

    #[tokio::test]
    async fn pending_response_shape() {
        let resp = pending_response("NVDA");
        assert_eq!(resp["_served_from"], json!("pending"));
        assert_eq!(resp["symbol"], json!("NVDA"));
        assert_eq!(resp["meta"]["bots_run"], json!(0));
    }

    #[tokio::test]
    async fn refresh_claim_is_single_winner() {
        let engine = test_engine();
        let first = maybe_trigger_refresh(&engine, "AAPL").await;
        let second = maybe_trigger_refresh(&engine, "AAPL").await;
        assert!(first);
        assert!(!second);
        engine.release_refresh("AAPL").await;
    }

    #[test]
    fn section_ttl_matches_bot_cache_ttl_table() {
        assert_eq!(section_ttl("news"), Some(std::time::Duration::from_secs(7200)));
        assert_eq!(section_ttl("macro"), Some(std::time::Duration::from_secs(3600)));
        assert_eq!(section_ttl("unknown"), None);
    }
}
