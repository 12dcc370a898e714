//! The continuously-refreshing market research engine.
//!
//! Overview
//! - [`engine`] holds the shared state a running instance needs: cache,
//!   per-provider rate limiter, sweep concurrency gate, priority-tier
//!   manager, and the registered bot fleet.
//! - [`sweeper`] runs one asset through its asset-type-appropriate bots,
//!   merges their signal inputs, detects significant deltas against the
//!   previous envelope, and writes the result back to the cache.
//! - [`scheduler`] drives the sweeper off a fixed Europe/London cron
//!   table tuned to market hours, plus an on-demand trigger.
//! - [`http`] exposes a read-only `/research` endpoint (cache-only,
//!   with opportunistic background refresh) and two admin routes.
//! - [`filters`] and [`universe`] are shared helpers the scheduler uses
//!   to turn tier membership into the symbol list for one job.
#![warn(missing_docs)]

pub mod engine;
pub mod http;
pub mod scheduler;
pub mod sweeper;

pub(crate) mod filters;
pub(crate) mod universe;

pub use engine::Engine;
pub use http::{router, AppState};
pub use scheduler::{trigger_sweep_now, JobStatus, Scheduler};
pub use sweeper::{sweep_asset, SweepRequest};
