//! Universe ingestion is an external producer (§1); this module only
//! knows how to read what it publishes under `universe:assets` and to
//! fall back to the static Tier-1 seed list when nothing has been
//! published yet (mirrors the reference scheduler's `_load_universe`).

use std::collections::HashMap;

use market_core::{AssetMeta, QuoteType, TIER1_STATIC};

use crate::engine::Engine;

/// Load the published asset universe, keyed by ticker.
///
/// Falls back to a minimal `AssetMeta` for each static Tier-1 symbol
/// when `universe:assets` has never been written (e.g. a cold start
/// before the ingestion pipeline has run).
pub async fn load_universe(engine: &Engine) -> HashMap<String, AssetMeta> {
    let cached: Option<Vec<AssetMeta>> = engine.cache.get(market_middleware::UNIVERSE_KEY).await;
    if let Some(assets) = cached {
        if !assets.is_empty() {
            return assets.into_iter().map(|a| (a.ticker.clone(), a)).collect();
        }
    }
    TIER1_STATIC
        .iter()
        .map(|ticker| {
            (
                (*ticker).to_string(),
                AssetMeta {
                    ticker: (*ticker).to_string(),
                    name: (*ticker).to_string(),
                    sector: Some("Unknown".to_string()),
                    industry: None,
                    exchange: None,
                    country: None,
                    currency: None,
                    quote_type: QuoteType::Equity,
                },
            )
        })
        .collect()
}

/// Look up `symbol` in `universe`, falling back to a minimal stand-in
/// when universe ingestion hasn't published metadata for it yet —
/// mirrors the reference `_run`'s `universe.get(sym, {...})` default.
#[must_use]
pub fn asset_or_default(universe: &HashMap<String, AssetMeta>, symbol: &str) -> AssetMeta {
    universe.get(symbol).cloned().unwrap_or_else(|| AssetMeta {
        ticker: symbol.to_string(),
        name: symbol.to_string(),
        sector: Some("Unknown".to_string()),
        industry: None,
        exchange: None,
        country: None,
        currency: None,
        quote_type: QuoteType::Equity,
    })
}
