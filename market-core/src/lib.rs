//! market-core
//!
//! Core domain types, the `ResearchBot` trait, delta detection,
//! asset-type derivation, and the priority-tier manager shared across
//! the market research engine workspace.
//!
//! - `types`: `BotResult`, `ResearchPayload`, `ResearchMeta`, `AssetMeta`.
//! - `bot`: the `ResearchBot` trait every data-source adapter implements.
//! - `delta`: semantic diff between two research payloads.
//! - `asset_type`: deterministic `asset_type` derivation from asset metadata.
//! - `priority`: the Tier-1/2/3 priority-tier manager.
//! - `error`: the workspace-wide `ResearchError` enum.
#![warn(missing_docs)]

/// Deterministic asset-type derivation (§4.7).
pub mod asset_type;
/// The `ResearchBot` trait every data-source adapter implements.
pub mod bot;
/// Semantic diff of two research payload `data` blocks.
pub mod delta;
/// Core error type shared across the workspace.
pub mod error;
/// Dynamic classification of assets into sweep-frequency tiers.
pub mod priority;
pub mod types;

pub use asset_type::{derive_asset_type, is_non_us, NON_US_SUFFIXES};
pub use bot::ResearchBot;
pub use delta::{
    compute_stale_fields, detect_delta, is_significant_change, ALWAYS_SIGNIFICANT, IGNORE_FIELDS, NUMERIC_THRESHOLD,
};
pub use error::ResearchError;
pub use priority::{PriorityManager, PrioritySummary, Tier, TIER1_STATIC, TIER2_STATIC};
pub use types::{
    AssetMeta, AssetType, BotResult, BotStatus, DataFreshness, QuoteType, ResearchMeta, ResearchPayload, SECTION_NAMES,
    SIGNAL_INPUT_KEYS,
};
