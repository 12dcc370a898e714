//! GNews headline-sentiment adapter (§4.3, §4.3a).

use std::time::Duration;

use async_trait::async_trait;
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::json;

use crate::providers::gnews::{GNewsClient, Headline};

const CATALYST_POSITIVE: &[&str] = &[
    "beats estimates",
    "earnings beat",
    "fda approval",
    "fda clearance",
    "merger",
    "acquisition",
    "partnership",
    "upgrade",
    "guidance raise",
    "stock split",
    "buyback",
];

const CATALYST_NEGATIVE: &[&str] = &[
    "lawsuit",
    "sec investigation",
    "data breach",
    "recall",
    "downgrade",
    "guidance cut",
    "bankruptcy",
];

const POSITIVE_WORDS: &[&str] = &[
    "surge", "soar", "rally", "beat", "beats", "record", "strong", "growth", "gain", "gains",
    "rise", "rises", "jump", "jumps", "outperform", "bullish", "profit", "profitable", "boost",
    "upgraded", "exceeds", "robust", "positive",
];

const NEGATIVE_WORDS: &[&str] = &[
    "plunge", "slump", "miss", "misses", "fall", "falls", "drop", "drops", "decline", "weak",
    "loss", "losses", "cut", "cuts", "downgraded", "bearish", "warning", "concern", "concerns",
    "negative", "crash", "sell-off", "selloff",
];

/// GNews-backed news-sentiment bot (§4.3, §4.3a).
pub struct NewsBot {
    gnews: GNewsClient,
}

impl NewsBot {
    /// Build the bot from an already-configured [`GNewsClient`].
    #[must_use]
    pub fn new(gnews: GNewsClient) -> Self {
        Self { gnews }
    }
}

#[async_trait]
impl ResearchBot for NewsBot {
    fn name(&self) -> &'static str {
        "NewsBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(2 * 3600)
    }

    async fn fetch(&self, symbol: &str, asset: &AssetMeta) -> BotResult {
        let query = if asset.name.is_empty() { symbol } else { &asset.name };

        let headlines = match self.gnews.search(query).await {
            Ok(h) => h,
            Err(e) => return BotResult::failed(self.name(), symbol, "gnews", e.to_string()),
        };

        if headlines.is_empty() {
            let mut result = BotResult::failed(self.name(), symbol, "gnews", "no headlines found");
            result.confidence = 0.3;
            result.error = None;
            result.summary = "No recent news coverage.".to_string();
            result.raw = json!({"headlines": []});
            return result;
        }

        let mut sentiment_sum = 0.0_f64;
        let mut catalyst_sum = 0.0_f64;
        let mut catalyst_count = 0usize;
        let mut bull_factors = Vec::new();
        let mut bear_factors = Vec::new();
        let mut titles = Vec::with_capacity(headlines.len());

        for headline in &headlines {
            let text = format!("{} {}", headline.title, headline.description).to_lowercase();
            let headline_score = score_words(&text);
            sentiment_sum += headline_score;

            if let Some(direction) = catalyst_direction(&text) {
                catalyst_sum += direction;
                catalyst_count += 1;
                if direction > 0.0 {
                    bull_factors.push(format!("Catalyst: {}", headline.title));
                } else {
                    bear_factors.push(format!("Catalyst: {}", headline.title));
                }
            }
            titles.push(headline.title.clone());
        }

        let count = headlines.len() as f64;
        let sentiment = (sentiment_sum / count).clamp(-1.0, 1.0);
        let catalyst_news = if catalyst_count > 0 {
            (catalyst_sum / catalyst_count as f64).clamp(-1.0, 1.0)
        } else {
            (sentiment * 0.5).clamp(-1.0, 1.0)
        };

        let confidence = (0.3 + 0.06 * count).min(0.9);

        let mut result = BotResult {
            bot_name: self.name().to_string(),
            ticker: symbol.to_string(),
            signal_inputs: [
                ("sentiment".to_string(), round3(sentiment)),
                ("catalystNews".to_string(), round3(catalyst_news)),
            ]
            .into_iter()
            .collect(),
            bull_factors,
            bear_factors,
            summary: format!("{} headlines scanned, sentiment {:+.2}", headlines.len(), sentiment),
            confidence,
            source: "gnews".to_string(),
            raw: json!({"headlines": titles}),
            error: None,
        };
        result.bull_factors.truncate(6);
        result.bear_factors.truncate(6);
        result
    }
}

fn score_words(text: &str) -> f64 {
    let pos = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
    let neg = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
    if pos + neg == 0.0 {
        0.0
    } else {
        ((pos - neg) / (pos + neg)).clamp(-1.0, 1.0)
    }
}

fn catalyst_direction(text: &str) -> Option<f64> {
    if CATALYST_POSITIVE.iter().any(|p| text.contains(p)) {
        Some(1.0)
    } else if CATALYST_NEGATIVE.iter().any(|p| text.contains(p)) {
        Some(-1.0)
    } else {
        None
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalyst_phrase_wins_over_bag_of_words() {
        assert_eq!(catalyst_direction("company announces merger with rival"), Some(1.0));
        assert_eq!(catalyst_direction("sec investigation opens into trading practices"), Some(-1.0));
        assert_eq!(catalyst_direction("shares were mixed today"), None);
    }

    #[test]
    fn sentiment_bag_of_words_is_symmetric_and_clamped() {
        assert!(score_words("surge rally beat strong gain") > 0.0);
        assert!(score_words("plunge slump miss weak loss") < 0.0);
        assert_eq!(score_words("the quick brown fox"), 0.0);
    }
}
