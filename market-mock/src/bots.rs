//! Deterministic fixture bots, one per real adapter in `market-bots`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::json;

/// Ticker that makes every mock bot return a failed result (§7 scenario 2).
pub const FAIL_SYMBOL: &str = "FAIL";
/// Ticker that makes every mock bot sleep briefly before answering, to
/// exercise soft-budget/timeout handling without a real slow provider.
pub const TIMEOUT_SYMBOL: &str = "TIMEOUT";

/// FNV-1a over the ticker bytes, so each symbol gets stable-but-varied
/// fixture values without needing a real RNG (and thus staying
/// reproducible across test runs).
fn seed(ticker: &str, salt: u64) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ salt;
    for byte in ticker.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

/// Deterministic pseudo-random value in `[0, 1)` for `ticker`/`salt`.
fn unit(ticker: &str, salt: u64) -> f64 {
    (seed(ticker, salt) % 1_000_000) as f64 / 1_000_000.0
}

/// Map `unit(..)` into `[lo, hi]`.
fn ranged(ticker: &str, salt: u64, lo: f64, hi: f64) -> f64 {
    lo + unit(ticker, salt) * (hi - lo)
}

async fn maybe_misbehave(bot_name: &str, ticker: &str) -> Option<BotResult> {
    if ticker == FAIL_SYMBOL {
        return Some(BotResult::failed(bot_name, ticker, "mock", "forced failure (FAIL sentinel)"));
    }
    if ticker == TIMEOUT_SYMBOL {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    None
}

macro_rules! mock_bot {
    ($struct_name:ident, $name:literal, $ttl_secs:expr, $build:ident) => {
        /// Deterministic stand-in for the real bot of the same name.
        pub struct $struct_name;

        #[async_trait]
        impl ResearchBot for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }

            fn cache_ttl(&self) -> Duration {
                Duration::from_secs($ttl_secs)
            }

            async fn fetch(&self, symbol: &str, asset: &AssetMeta) -> BotResult {
                if let Some(failed) = maybe_misbehave($name, symbol).await {
                    return failed;
                }
                $build(symbol, asset)
            }
        }
    };
}

fn build_news(symbol: &str, _asset: &AssetMeta) -> BotResult {
    let sentiment = ranged(symbol, 1, -1.0, 1.0);
    let catalyst = ranged(symbol, 2, -1.0, 1.0);
    let mut bull = Vec::new();
    let mut bear = Vec::new();
    if sentiment > 0.2 {
        bull.push("Mock headline: analysts note constructive coverage".to_string());
    } else if sentiment < -0.2 {
        bear.push("Mock headline: analysts flag cautious coverage".to_string());
    }
    BotResult {
        bot_name: "NewsBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [("sentiment".to_string(), round3(sentiment)), ("catalystNews".to_string(), round3(catalyst))]
            .into_iter()
            .collect(),
        bull_factors: bull,
        bear_factors: bear,
        summary: format!("mock sentiment {sentiment:+.2}"),
        confidence: 0.6,
        source: "mock-gnews".to_string(),
        raw: json!({"headlines": [format!("{symbol} mock headline")]}),
        error: None,
    }
}

fn build_earnings(symbol: &str, _asset: &AssetMeta) -> BotResult {
    let days = ranged(symbol, 3, 0.0, 90.0).round();
    let beat = ranged(symbol, 4, -25.0, 40.0);
    BotResult {
        bot_name: "EarningsBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [("daysToEarnings".to_string(), days), ("earningsBeat".to_string(), round3(beat))]
            .into_iter()
            .collect(),
        bull_factors: if beat > 5.0 { vec!["Beat EPS estimates last quarter".to_string()] } else { vec![] },
        bear_factors: if beat < -5.0 { vec!["Missed EPS estimates last quarter".to_string()] } else { vec![] },
        summary: format!("next earnings in {days:.0}d, last beat {beat:+.1}%"),
        confidence: 0.75,
        source: "mock-fmp".to_string(),
        raw: json!({"days_to_earnings": days, "earnings_beat_pct": beat}),
        error: None,
    }
}

fn build_macro(symbol: &str, _asset: &AssetMeta) -> BotResult {
    let flow = ranged(symbol, 5, -1.0, 1.0);
    BotResult {
        bot_name: "MacroBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [("sectorFlow".to_string(), round3(flow))].into_iter().collect(),
        bull_factors: if flow > 0.2 { vec!["Sector tailwind from macro conditions".to_string()] } else { vec![] },
        bear_factors: if flow < -0.2 { vec!["Sector headwind from macro conditions".to_string()] } else { vec![] },
        summary: format!("mock sector flow {flow:+.2}"),
        confidence: 0.7,
        source: "mock-fred".to_string(),
        raw: json!({"sector_flow": flow}),
        error: None,
    }
}

fn build_insider(symbol: &str, _asset: &AssetMeta) -> BotResult {
    if market_core::is_non_us(symbol) {
        return BotResult {
            bot_name: "InsiderBot".to_string(),
            ticker: symbol.to_string(),
            signal_inputs: [("insiderBuy".to_string(), 0.5)].into_iter().collect(),
            bull_factors: vec![],
            bear_factors: vec![],
            summary: "non-US ticker, neutral".to_string(),
            confidence: 0.5,
            source: "mock-sec-edgar".to_string(),
            raw: json!({"filings": []}),
            error: None,
        };
    }
    let buy = ranged(symbol, 6, 0.0, 1.0);
    BotResult {
        bot_name: "InsiderBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [("insiderBuy".to_string(), round3(buy))].into_iter().collect(),
        bull_factors: if buy > 0.6 { vec!["Net insider buying over trailing 90 days".to_string()] } else { vec![] },
        bear_factors: if buy < 0.4 { vec!["Net insider selling over trailing 90 days".to_string()] } else { vec![] },
        summary: format!("mock insiderBuy {buy:.2}"),
        confidence: 0.8,
        source: "mock-sec-edgar".to_string(),
        raw: json!({"buy_score": buy}),
        error: None,
    }
}

fn build_fundamentals(symbol: &str, _asset: &AssetMeta) -> BotResult {
    let rev_growth = ranged(symbol, 7, -20.0, 40.0);
    let debt_ratio = ranged(symbol, 8, 0.0, 3.0);
    let short_int = ranged(symbol, 9, 0.0, 15.0);
    BotResult {
        bot_name: "FundamentalsBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [
            ("revGrowth".to_string(), round3(rev_growth)),
            ("debtRatio".to_string(), round3(debt_ratio)),
            ("shortInt".to_string(), round3(short_int)),
        ]
        .into_iter()
        .collect(),
        bull_factors: if rev_growth > 10.0 { vec!["Revenue growth above sector average".to_string()] } else { vec![] },
        bear_factors: if debt_ratio > 2.0 { vec!["Elevated debt load vs. peers".to_string()] } else { vec![] },
        summary: format!("mock revGrowth {rev_growth:+.1}%"),
        confidence: 0.85,
        source: "mock-fmp".to_string(),
        raw: json!({"rev_growth_pct": rev_growth, "debt_ratio": debt_ratio, "short_pct": short_int}),
        error: None,
    }
}

fn build_technical_levels(symbol: &str, _asset: &AssetMeta) -> BotResult {
    let year_pos = ranged(symbol, 10, 0.0, 100.0);
    let golden_cross = unit(symbol, 11) > 0.9;
    let death_cross = !golden_cross && unit(symbol, 12) > 0.9;
    let mut bull = Vec::new();
    let mut bear = Vec::new();
    if golden_cross {
        bull.push("Golden cross (MA50 > MA200) — strong technical buy signal".to_string());
    }
    if death_cross {
        bear.push("Death cross (MA50 < MA200) — strong technical sell signal".to_string());
    }
    if bull.is_empty() {
        bull.push(format!("{year_pos:.0}th percentile of 52-week range"));
    }
    if bear.is_empty() {
        bear.push("No major technical resistance flagged".to_string());
    }
    BotResult {
        bot_name: "TechnicalLevelsBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: std::collections::HashMap::new(),
        bull_factors: bull,
        bear_factors: bear,
        summary: format!("mock {year_pos:.0}th pct 52wk"),
        confidence: 0.8,
        source: "mock-polygon".to_string(),
        raw: json!({"year_position_pct": year_pos, "golden_cross": golden_cross, "death_cross": death_cross}),
        error: None,
    }
}

fn build_analyst(symbol: &str, _asset: &AssetMeta) -> BotResult {
    let analysts = 3 + (seed(symbol, 13) % 20) as u32;
    let sentiment = ranged(symbol, 14, -0.3, 0.3);
    let upside = ranged(symbol, 15, -0.2, 0.3);
    BotResult {
        bot_name: "AnalystBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [("sentiment".to_string(), round3(sentiment))].into_iter().collect(),
        bull_factors: if upside > 0.1 { vec!["Price target implies meaningful upside".to_string()] } else { vec![] },
        bear_factors: if upside < -0.05 { vec!["Price target implies downside".to_string()] } else { vec![] },
        summary: format!("mock consensus from {analysts} analysts, upside {upside:+.1%}"),
        confidence: 0.7,
        source: "mock-fmp".to_string(),
        raw: json!({"analyst_count": analysts, "upside_pct": upside * 100.0}),
        error: None,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

mock_bot!(MockNewsBot, "NewsBot", 2 * 3600, build_news);
mock_bot!(MockEarningsBot, "EarningsBot", 4 * 3600, build_earnings);
mock_bot!(MockMacroBot, "MacroBot", 3600, build_macro);
mock_bot!(MockInsiderBot, "InsiderBot", 21600, build_insider);
mock_bot!(MockFundamentalsBot, "FundamentalsBot", 4 * 3600, build_fundamentals);
mock_bot!(MockTechnicalLevelsBot, "TechnicalLevelsBot", 3600, build_technical_levels);
mock_bot!(MockAnalystBot, "AnalystBot", 4 * 3600, build_analyst);

/// Build a fresh [`MockNewsBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_news_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockNewsBot)
}

/// Build a fresh [`MockEarningsBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_earnings_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockEarningsBot)
}

/// Build a fresh [`MockMacroBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_macro_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockMacroBot)
}

/// Build a fresh [`MockInsiderBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_insider_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockInsiderBot)
}

/// Build a fresh [`MockFundamentalsBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_fundamentals_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockFundamentalsBot)
}

/// Build a fresh [`MockTechnicalLevelsBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_technical_levels_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockTechnicalLevelsBot)
}

/// Build a fresh [`MockAnalystBot`], boxed as a [`ResearchBot`] trait object.
#[must_use]
pub fn mock_analyst_bot() -> Arc<dyn ResearchBot> {
    Arc::new(MockAnalystBot)
}

/// All seven mock bots, keyed by bot name — a drop-in registry for
/// tests that would otherwise need live provider credentials.
#[must_use]
pub fn all_mock_bots() -> Vec<Arc<dyn ResearchBot>> {
    vec![
        mock_news_bot(),
        mock_earnings_bot(),
        mock_macro_bot(),
        mock_insider_bot(),
        mock_fundamentals_bot(),
        mock_technical_levels_bot(),
        mock_analyst_bot(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fail_symbol_fails_every_bot() {
        let asset = AssetMeta {
            ticker: FAIL_SYMBOL.to_string(),
            name: String::new(),
            sector: None,
            industry: None,
            exchange: None,
            country: None,
            currency: None,
            quote_type: market_core::QuoteType::Equity,
        };
        for bot in all_mock_bots() {
            let result = bot.fetch(FAIL_SYMBOL, &asset).await;
            assert!(result.is_failure(), "{} should fail for FAIL", bot.name());
        }
    }

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(unit("AAPL", 1), unit("AAPL", 1));
        assert_ne!(unit("AAPL", 1), unit("MSFT", 1));
    }

    #[tokio::test]
    async fn news_signal_inputs_within_range() {
        let asset = AssetMeta {
            ticker: "AAPL".to_string(),
            name: "Apple".to_string(),
            sector: None,
            industry: None,
            exchange: None,
            country: None,
            currency: None,
            quote_type: market_core::QuoteType::Equity,
        };
        let result = mock_news_bot().fetch("AAPL", &asset).await;
        assert!((-1.0..=1.0).contains(&result.signal_inputs["sentiment"]));
        assert!((-1.0..=1.0).contains(&result.signal_inputs["catalystNews"]));
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}
