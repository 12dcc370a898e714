//! Market-aware cron dispatch (§4.9): eleven recurring jobs, one per
//! market moment, each choosing its own asset filter and bot policy.
//! Grounded on the reference `research_engine/orchestrator/scheduler.py`
//! job table and `_run` sequential-per-symbol loop.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Europe::London;
use market_core::AssetMeta;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
#[cfg(feature = "tracing")]
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::Engine;
use crate::filters::{drop_matching, is_asian_adr, is_commodity_forex, is_crypto, is_uk_eu, is_us, pick, union};
use crate::sweeper::{sweep_asset, SweepRequest};
use crate::universe::{asset_or_default, load_universe};

/// The bot bundles named in the reference scheduler's `BOTS_*` constants (§4.9).
mod bundles {
    pub const FAST: &[&str] = &["TechnicalLevelsBot", "NewsBot"];
    pub const PREMARKET: &[&str] =
        &["NewsBot", "EarningsBot", "AnalystBot", "FundamentalsBot", "MacroBot", "TechnicalLevelsBot"];
    pub const CLOSE: &[&str] =
        &["TechnicalLevelsBot", "NewsBot", "EarningsBot", "FundamentalsBot", "AnalystBot", "MacroBot"];
    pub const OVERNIGHT: &[&str] = &["NewsBot", "EarningsBot", "TechnicalLevelsBot"];
    pub const INTRADAY: &[&str] = &["TechnicalLevelsBot", "NewsBot", "MacroBot"];
    pub const UK_PREMARKET: &[&str] = &["MacroBot", "NewsBot", "TechnicalLevelsBot"];
    pub const US_MIDSESSION: &[&str] = &["TechnicalLevelsBot", "NewsBot", "AnalystBot"];
}

fn strings(bots: &[&'static str]) -> Vec<String> {
    bots.iter().map(|s| (*s).to_string()).collect()
}

/// Static metadata for one scheduled job, used by `/admin/scheduler` (§6.1).
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Stable job id, matches the reference scheduler's job ids.
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    /// Six-field cron expression (sec min hour dom month dow), Europe/London civil time.
    pub cron: &'static str,
}

/// The fixed eleven-entry recurring job table plus the Tier-3 weekly sweep (§4.9).
pub const JOB_TABLE: &[JobDescriptor] = &[
    JobDescriptor { id: "overnight", name: "02:00 UK Overnight — Asia/Crypto/Post-market", cron: "0 0 2 * * *" },
    JobDescriptor { id: "uk_premarket", name: "07:00 UK UK Pre-Market — macro data + EU prep", cron: "0 0 7 * * *" },
    JobDescriptor { id: "uk_open", name: "08:15 UK London Open — fast (Technicals+News)", cron: "0 15 8 * * mon-fri" },
    JobDescriptor { id: "uk_midsession", name: "11:30 UK UK Mid-Session", cron: "0 30 11 * * mon-fri" },
    JobDescriptor { id: "us_premarket", name: "12:00 UK US Pre-Market — full sweep", cron: "0 0 12 * * *" },
    JobDescriptor { id: "us_open", name: "14:45 UK NYSE Open — fast (Technicals+News)", cron: "0 45 14 * * mon-fri" },
    JobDescriptor { id: "uk_close", name: "16:45 UK London Close — full EU snapshot", cron: "0 45 16 * * mon-fri" },
    JobDescriptor { id: "us_midsession", name: "17:00 UK US Mid-Session", cron: "0 0 17 * * mon-fri" },
    JobDescriptor { id: "us_close", name: "21:15 UK US Close — full snapshot", cron: "0 15 21 * * mon-fri" },
    JobDescriptor { id: "post_market", name: "23:00 UK Post-Market — earnings + crypto", cron: "0 0 23 * * mon-fri" },
    JobDescriptor { id: "weekend_prep", name: "Sun 23:30 UK Weekend Prep — full reset", cron: "0 30 23 * * sun" },
    JobDescriptor { id: "tier3_weekly", name: "Sun 02:00 UK Tier-3 Weekly Deep Sweep", cron: "0 0 2 * * sun" },
];

/// Run one named sweep batch sequentially over `symbols`, pausing
/// gently between assets (§4.4, §5, §9 — "cadence is controlled by
/// rate-limiter waits", not by sweeping symbols in parallel).
pub async fn run_batch(
    engine: &Engine,
    cycle: &str,
    symbols: &[String],
    universe: &HashMap<String, AssetMeta>,
    priority_bots: Option<Vec<String>>,
    bots_override: Option<Vec<String>>,
) {
    if symbols.is_empty() {
        #[cfg(feature = "tracing")]
        info!(cycle, "no symbols selected — skipped");
        return;
    }

    #[cfg(feature = "tracing")]
    info!(cycle, count = symbols.len(), "sweep batch starting");

    let mut ok = 0usize;
    let mut failed = 0usize;
    for symbol in symbols {
        let asset = asset_or_default(universe, symbol);
        let req = SweepRequest {
            cycle: cycle.to_string(),
            force: bots_override.is_some(),
            priority_bots: priority_bots.clone(),
            bots_override: bots_override.clone(),
        };
        let payload = sweep_asset(engine, symbol, &asset, req).await;
        if payload.meta.bots.values().any(|s| matches!(s, market_core::BotStatus::Success | market_core::BotStatus::Cached)) {
            ok += 1;
        } else {
            failed += 1;
        }
        tokio::time::sleep(engine.config.sweep_inter_asset_pause).await;
    }

    #[cfg(feature = "tracing")]
    info!(cycle, ok, failed, "sweep batch done");
    #[cfg(not(feature = "tracing"))]
    let _ = (ok, failed);
}

/// Build this job's symbol list from current tier/universe state, one
/// branch per job id — mirrors the reference `job_*` functions' target selection.
async fn targets_for_job(engine: &Engine, job_id: &str) -> (Vec<String>, Option<Vec<String>>, Option<Vec<String>>) {
    let tier1 = engine.priority.get_tier1();
    let tier2 = engine.priority.get_tier2();
    let tier3 = engine.priority.get_tier3();

    match job_id {
        "overnight" => (
            pick(&tier1, &[is_us, is_crypto, is_asian_adr]),
            None,
            Some(strings(bundles::OVERNIGHT)),
        ),
        "uk_premarket" => (
            union(vec![pick(&tier1, &[is_uk_eu, is_commodity_forex]), pick(&tier2, &[is_uk_eu])]),
            Some(strings(bundles::UK_PREMARKET)),
            None,
        ),
        "uk_open" => (
            union(vec![pick(&tier1, &[is_uk_eu]), pick(&tier2, &[is_uk_eu])]),
            None,
            Some(strings(bundles::FAST)),
        ),
        "uk_midsession" => (tier1.clone(), Some(strings(bundles::INTRADAY)), None),
        "us_premarket" => (
            union(vec![pick(&tier1, &[is_us]), pick(&tier2, &[is_us]), pick(&tier1, &[is_crypto])]),
            Some(strings(bundles::PREMARKET)),
            None,
        ),
        "us_open" => (
            union(vec![pick(&tier1, &[is_us]), pick(&tier1, &[is_crypto])]),
            None,
            Some(strings(bundles::FAST)),
        ),
        "uk_close" => (
            union(vec![pick(&tier1, &[is_uk_eu]), pick(&tier2, &[is_uk_eu])]),
            Some(strings(bundles::CLOSE)),
            None,
        ),
        "us_midsession" => (pick(&tier1, &[is_us]), Some(strings(bundles::US_MIDSESSION)), None),
        "us_close" => (
            union(vec![drop_matching(&tier1, &[is_uk_eu]), drop_matching(&tier2, &[is_uk_eu])]),
            Some(strings(bundles::CLOSE)),
            None,
        ),
        "post_market" => (
            union(vec![pick(&tier1, &[is_us]), pick(&tier1, &[is_crypto])]),
            None,
            Some(strings(bundles::OVERNIGHT)),
        ),
        "weekend_prep" => (union(vec![tier1.clone(), tier2.clone()]), Some(strings(bundles::PREMARKET)), None),
        "tier3_weekly" => (tier3, None, None),
        other => {
            #[cfg(feature = "tracing")]
            warn!(job_id = other, "unknown job id requested");
            (Vec::new(), None, None)
        }
    }
}

/// Dispatch one scheduled job by id: load the universe, compute this
/// job's targets, and run the batch. Weekday-only jobs are registered
/// with a `mon-fri` cron day-of-week field, so no separate runtime
/// weekday check is needed (unlike the reference's `weekday_only` flag,
/// which layered it on top of an always-registered job).
async fn run_job(engine: &Engine, job_id: &'static str) {
    let universe = load_universe(engine).await;
    let (symbols, priority_bots, bots_override) = targets_for_job(engine, job_id).await;
    run_batch(engine, job_id, &symbols, &universe, priority_bots, bots_override).await;
}

/// Owns the live `tokio-cron-scheduler` instance and a reentrancy guard
/// so a slow job can't overlap with its own next tick (§4.9's "at most
/// one concurrent instance per job id").
pub struct Scheduler {
    inner: JobScheduler,
    running: Arc<Mutex<HashSet<&'static str>>>,
    job_ids: HashMap<&'static str, Uuid>,
}

impl Scheduler {
    /// Build and register all twelve jobs against `engine`, in their
    /// `Europe/London` civil-time schedule (DST handled by `chrono-tz`).
    ///
    /// # Errors
    /// Propagates `tokio-cron-scheduler` construction/registration failures.
    pub async fn start(engine: Arc<Engine>) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        let running: Arc<Mutex<HashSet<&'static str>>> = Arc::new(Mutex::new(HashSet::new()));
        let mut job_ids = HashMap::new();

        for descriptor in JOB_TABLE {
            let engine = engine.clone();
            let running = running.clone();
            let job_id = descriptor.id;
            let job = Job::new_async_tz(descriptor.cron, London, move |_uuid, _sched| {
                let engine = engine.clone();
                let running = running.clone();
                Box::pin(async move {
                    {
                        let mut running = running.lock().await;
                        if !running.insert(job_id) {
                            #[cfg(feature = "tracing")]
                            warn!(job_id, "previous instance still running — skipping this tick");
                            return;
                        }
                    }
                    run_job(&engine, job_id).await;
                    running.lock().await.remove(job_id);
                })
            })?;
            let uuid = inner.add(job).await?;
            job_ids.insert(job_id, uuid);
        }

        inner.start().await?;
        #[cfg(feature = "tracing")]
        info!(jobs = JOB_TABLE.len(), "scheduler started");

        Ok(Self { inner, running, job_ids })
    }

    /// Snapshot of job status for `/admin/scheduler` (§6.1): id, name,
    /// and next scheduled fire time in UTC.
    pub async fn status(&self) -> Vec<JobStatus> {
        let mut out = Vec::new();
        for descriptor in JOB_TABLE {
            let next_run = if let Some(uuid) = self.job_ids.get(descriptor.id) {
                self.inner.next_tick_for_job(*uuid).await.ok().flatten()
            } else {
                None
            };
            out.push(JobStatus { id: descriptor.id, name: descriptor.name, next_run });
        }
        out.sort_by(|a, b| a.next_run.cmp(&b.next_run));
        out
    }

    /// Gracefully stop the scheduler. Running tasks are not cancelled;
    /// the caller is expected to wait a short grace window afterward (§5).
    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await
    }
}

/// One job's status entry, as served by `/admin/scheduler`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobStatus {
    /// Stable job id.
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    /// Next scheduled fire time, UTC.
    pub next_run: Option<chrono::DateTime<Utc>>,
}

/// Manually trigger an out-of-band sweep (§4.9's `TriggerSweepNow`, §6.1's
/// `POST /admin/sweep`). Runs in the background; the caller does not wait
/// for it to finish.
pub fn trigger_sweep_now(engine: Arc<Engine>, tier: u8, cycle: String) -> usize {
    let symbols = match tier {
        1 => engine.priority.get_tier1(),
        2 => {
            let mut s = engine.priority.get_tier1();
            s.extend(engine.priority.get_tier2());
            s
        }
        _ => engine.priority.get_all_ordered(),
    };
    let count = symbols.len();
    tokio::spawn(async move {
        let universe = load_universe(&engine).await;
        run_batch(&engine, &cycle, &symbols, &universe, Some(strings(bundles::PREMARKET)), None).await;
    });
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_mock::all_mock_bots;
    use market_types::EngineConfig;

    fn test_engine() -> Engine {
        Engine::new(EngineConfig::default(), all_mock_bots())
    }

    #[tokio::test]
    async fn overnight_targets_us_tier1_crypto_and_asian_adrs() {
        let engine = test_engine();
        let (symbols, _, bots) = targets_for_job(&engine, "overnight").await;
        assert!(symbols.contains(&"AAPL".to_string()));
        assert!(symbols.contains(&"BTC-USD".to_string()));
        assert!(!symbols.contains(&"BP.L".to_string()));
        assert_eq!(bots, Some(strings(bundles::OVERNIGHT)));
    }

    #[tokio::test]
    async fn uk_close_excludes_non_uk_eu_tier1() {
        let engine = test_engine();
        let (symbols, priority, _) = targets_for_job(&engine, "uk_close").await;
        assert!(symbols.contains(&"BP.L".to_string()));
        assert!(!symbols.contains(&"AAPL".to_string()));
        assert_eq!(priority, Some(strings(bundles::CLOSE)));
    }

    #[tokio::test]
    async fn us_close_drops_uk_eu_tier1_and_tier2() {
        let engine = test_engine();
        let (symbols, _, _) = targets_for_job(&engine, "us_close").await;
        assert!(!symbols.iter().any(|s| is_uk_eu(s)));
    }

    #[tokio::test]
    async fn tier3_weekly_is_empty_by_default() {
        let engine = test_engine();
        let (symbols, _, _) = targets_for_job(&engine, "tier3_weekly").await;
        assert!(symbols.is_empty());
    }

    #[test]
    fn job_table_has_twelve_entries() {
        assert_eq!(JOB_TABLE.len(), 12);
    }
}
