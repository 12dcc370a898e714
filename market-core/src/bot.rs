//! The uniform contract every data-source adapter implements.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{AssetMeta, BotResult};

/// A pluggable adapter that fetches one slice of research from one or
/// more external data providers.
///
/// Implementations never let an error escape `fetch` — on failure they
/// return [`BotResult::failed`] with `confidence = 0.0` and `error`
/// set, so the sweeper can always assemble an envelope. Caching and
/// rate-limiter acquisition happen around a bot, not inside it: the
/// sweeper checks the per-bot cache first and acquires provider tokens
/// before calling `fetch`, per the framework contract (§4.3).
#[async_trait]
pub trait ResearchBot: Send + Sync {
    /// Stable bot name used as the cache-key component and in `meta.bots`.
    fn name(&self) -> &'static str;

    /// How long a successful result for this bot may be reused from
    /// the per-bot cache before the sweeper re-fetches it.
    fn cache_ttl(&self) -> Duration;

    /// Fetch and normalise this bot's slice of research for `symbol`.
    ///
    /// Always returns a `BotResult`, even on total provider failure.
    async fn fetch(&self, symbol: &str, asset: &AssetMeta) -> BotResult;
}
