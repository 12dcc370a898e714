//! Shared engine state: cache, rate limiter, sweep gate, priority
//! manager, and the bot registry every sweep draws from (§5).

use std::collections::HashSet;
use std::sync::Arc;

use market_core::{PriorityManager, ResearchBot};
use market_middleware::{CacheClient, RateLimiter, SweepLimiter};
use market_types::{CacheConfig, EngineConfig};
use tokio::sync::Mutex;

/// Everything one running instance of the engine needs, handed by
/// reference to the sweeper, scheduler, and HTTP surface alike.
pub struct Engine {
    /// Loaded configuration (provider keys, TTLs, concurrency limits).
    pub config: EngineConfig,
    /// The namespaced KV cache (§4.1).
    pub cache: CacheClient,
    /// Per-provider token-bucket rate limiter (§4.2).
    pub rate_limiter: RateLimiter,
    /// Global sweep concurrency gate (§4.2, §5).
    pub sweep_limiter: SweepLimiter,
    /// Tier-1/2/3 classification (§4.8).
    pub priority: PriorityManager,
    bots: Vec<Arc<dyn ResearchBot>>,
    in_flight: Mutex<HashSet<String>>,
}

impl Engine {
    /// Build an engine around an explicit bot registry — the seven real
    /// adapters in production, [`market_mock`]'s fixtures in tests.
    #[must_use]
    pub fn new(config: EngineConfig, bots: Vec<Arc<dyn ResearchBot>>) -> Self {
        let sweep_limiter = SweepLimiter::new(config.max_concurrent_sweeps);
        let cache = CacheClient::new(&CacheConfig::default());
        Self {
            config,
            cache,
            rate_limiter: RateLimiter::new(),
            sweep_limiter,
            priority: PriorityManager::new(),
            bots,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Build the production engine, wiring the seven real
    /// `market-bots` adapters from `config`'s provider API keys.
    #[must_use]
    pub fn production(config: EngineConfig) -> Self {
        let http = market_bots::BotHttpClient::new();
        let gnews = market_bots::providers::gnews::GNewsClient::new(http.clone(), config.gnews_key.clone());
        let fmp = market_bots::providers::fmp::FmpClient::new(http.clone(), config.fmp_key.clone());
        let alpha_vantage =
            market_bots::providers::alpha_vantage::AlphaVantageClient::new(http.clone(), config.alpha_vantage_key.clone());
        let polygon = market_bots::providers::polygon::PolygonClient::new(http.clone(), config.polygon_key.clone());
        let fred = market_bots::providers::fred::FredClient::new(http.clone(), config.fred_key.clone());
        let yahoo = market_bots::providers::yahoo::YahooClient::new(http.clone());
        let sec_edgar = market_bots::providers::sec_edgar::SecEdgarClient::new(http.clone());

        let bots: Vec<Arc<dyn ResearchBot>> = vec![
            Arc::new(market_bots::NewsBot::new(gnews)),
            Arc::new(market_bots::EarningsBot::new(fmp.clone(), yahoo.clone(), alpha_vantage)),
            Arc::new(market_bots::bots::macro_bot::MacroBot::new(fred, yahoo.clone())),
            Arc::new(market_bots::InsiderBot::new(sec_edgar)),
            Arc::new(market_bots::FundamentalsBot::new(fmp.clone(), yahoo.clone())),
            Arc::new(market_bots::TechnicalLevelsBot::new(polygon, yahoo.clone())),
            Arc::new(market_bots::bots::analyst::AnalystBot::new(fmp, yahoo)),
        ];

        Self::new(config, bots)
    }

    /// Look up a bot by its stable [`ResearchBot::name`].
    #[must_use]
    pub fn bot(&self, name: &str) -> Option<Arc<dyn ResearchBot>> {
        self.bots.iter().find(|b| b.name() == name).cloned()
    }

    /// All registered bots, in registration order.
    #[must_use]
    pub fn bots(&self) -> &[Arc<dyn ResearchBot>] {
        &self.bots
    }

    /// Attempt to claim `symbol` for a background refresh; returns
    /// `true` if this caller won the race and should trigger the sweep
    /// (§4.10, §5 — "in-flight dedup set" prevents duplicate
    /// background sweeps for the same symbol).
    pub async fn try_claim_refresh(&self, symbol: &str) -> bool {
        self.in_flight.lock().await.insert(symbol.to_string())
    }

    /// Release a symbol claimed via [`Self::try_claim_refresh`], whether the sweep succeeded or not.
    pub async fn release_refresh(&self, symbol: &str) {
        self.in_flight.lock().await.remove(symbol);
    }
}
