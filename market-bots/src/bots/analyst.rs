//! Price-target/consensus-rating adapter (§4.3, §4.3a).

use std::time::Duration;

use async_trait::async_trait;
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::{json, Value};

use crate::providers::fmp::FmpClient;
use crate::providers::yahoo::YahooClient;

/// Minimum number of covering analysts before a consensus is trusted
/// enough to feed `sentiment` (§4.3a).
const MIN_ANALYSTS: u32 = 3;

/// FMP/Yahoo-backed analyst-consensus bot (§4.3, §4.3a).
pub struct AnalystBot {
    fmp: FmpClient,
    yahoo: YahooClient,
}

impl AnalystBot {
    /// Build the bot from its two provider clients.
    #[must_use]
    pub fn new(fmp: FmpClient, yahoo: YahooClient) -> Self {
        Self { fmp, yahoo }
    }
}

#[async_trait]
impl ResearchBot for AnalystBot {
    fn name(&self) -> &'static str {
        "AnalystBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(4 * 3600)
    }

    async fn fetch(&self, symbol: &str, _asset: &AssetMeta) -> BotResult {
        let fmp_recs = self.fmp.analyst_recommendations(symbol).await.ok();
        let fmp_target = self.fmp.price_target(symbol).await.ok();
        let fmp_grades = self.fmp.upgrades_downgrades(symbol).await.ok();
        let yahoo_summary = if fmp_recs.is_none() {
            self.yahoo
                .quote_summary(symbol, &["recommendationTrend", "financialData"])
                .await
                .ok()
        } else {
            None
        };

        let Some(counts) = recommendation_counts(fmp_recs.as_ref(), yahoo_summary.as_ref()) else {
            return BotResult::failed(self.name(), symbol, "fmp+yahoo", "no analyst coverage found");
        };

        let total = counts.buy + counts.hold + counts.sell;
        if total == 0 {
            return BotResult::failed(self.name(), symbol, "fmp+yahoo", "zero analysts in consensus");
        }

        let mean_score = (counts.buy as f64 * 1.5 + counts.hold as f64 * 3.0 + counts.sell as f64 * 4.5) / total as f64;
        let (bucket, consensus_signal) = bucket_for(mean_score);

        let sentiment = if total >= MIN_ANALYSTS {
            round3((consensus_signal - 0.5) * 0.6)
        } else {
            0.0
        };

        let target_mean = fmp_target
            .as_ref()
            .and_then(first_row)
            .and_then(|row| row.get("priceTargetAverage").and_then(Value::as_f64))
            .or_else(|| yahoo_summary.as_ref().and_then(|s| pointer_f64(s, "/quoteSummary/result/0/financialData/targetMeanPrice/raw")));

        let current_price = yahoo_summary
            .as_ref()
            .and_then(|s| pointer_f64(s, "/quoteSummary/result/0/financialData/currentPrice/raw"))
            .or(target_mean);

        let upside = match (target_mean, current_price) {
            (Some(target), Some(price)) if price > 0.0 => Some((target - price) / price),
            _ => None,
        };

        let mut bull_factors = Vec::new();
        let mut bear_factors = Vec::new();

        match bucket {
            "Strong Buy" | "Buy" => bull_factors.push(format!("Analyst consensus: {bucket} ({total} analysts)")),
            "Moderate Sell" | "Sell" => bear_factors.push(format!("Analyst consensus: {bucket} ({total} analysts)")),
            _ => {}
        }
        if let Some(u) = upside {
            if u > 0.15 {
                bull_factors.push(format!("Price target implies {:.1}% upside", u * 100.0));
            } else if u < -0.1 {
                bear_factors.push(format!("Price target implies {:.1}% downside", u.abs() * 100.0));
            }
        }
        if total < MIN_ANALYSTS {
            bear_factors.push(format!("Thin analyst coverage ({total} analysts)"));
        }
        if let Some(change) = fmp_grades.as_ref().and_then(most_recent_grade_change) {
            let text = format!("{} {} to {} ({})", change.company, change.verb(), change.new_grade, change.previous_grade);
            if change.is_upgrade {
                bull_factors.push(text);
            } else {
                bear_factors.push(text);
            }
        }

        bull_factors.truncate(6);
        bear_factors.truncate(6);

        let confidence = if total >= MIN_ANALYSTS { 0.75 } else { 0.4 };

        BotResult {
            bot_name: self.name().to_string(),
            ticker: symbol.to_string(),
            signal_inputs: [("sentiment".to_string(), sentiment)].into_iter().collect(),
            bull_factors,
            bear_factors,
            summary: format!("{bucket} ({total} analysts), mean score {mean_score:.2}"),
            confidence,
            source: if fmp_recs.is_some() { "fmp".to_string() } else { "yahoo".to_string() },
            raw: json!({
                "recommendation": bucket,
                "mean_score": round3(mean_score),
                "analyst_count": total,
                "target_mean": target_mean,
                "upside": upside.map(round3),
                "recent_grade_change": fmp_grades.as_ref().and_then(most_recent_grade_change).map(|c| {
                    json!({"company": c.company, "new_grade": c.new_grade, "previous_grade": c.previous_grade, "is_upgrade": c.is_upgrade})
                }),
            }),
            error: None,
        }
    }
}

struct Counts {
    buy: u32,
    hold: u32,
    sell: u32,
}

fn recommendation_counts(fmp: Option<&Value>, yahoo: Option<&Value>) -> Option<Counts> {
    if let Some(value) = fmp {
        let row = first_row(value)?;
        let buy = sum_fields(row, &["analystRatingsStrongBuy", "analystRatingsbuy"]);
        let hold = sum_fields(row, &["analystRatingsHold"]);
        let sell = sum_fields(row, &["analystRatingsSell", "analystRatingsStrongSell"]);
        if buy + hold + sell > 0 {
            return Some(Counts { buy, hold, sell });
        }
    }
    if let Some(value) = yahoo {
        let trend = value.pointer("/quoteSummary/result/0/recommendationTrend/trend/0")?;
        let buy = sum_fields(trend, &["strongBuy", "buy"]);
        let hold = sum_fields(trend, &["hold"]);
        let sell = sum_fields(trend, &["sell", "strongSell"]);
        if buy + hold + sell > 0 {
            return Some(Counts { buy, hold, sell });
        }
    }
    None
}

fn sum_fields(row: &Value, fields: &[&str]) -> u32 {
    fields.iter().filter_map(|f| row.get(f).and_then(Value::as_u64)).sum::<u64>() as u32
}

/// Map a 1.0 (Strong Buy) .. 5.0 (Strong Sell) mean score to its
/// recommendation bucket and `[0,1]` consensus signal (§4.3a).
fn bucket_for(mean_score: f64) -> (&'static str, f64) {
    if mean_score < 1.5 {
        ("Strong Buy", 1.0)
    } else if mean_score < 2.0 {
        ("Buy", 0.75)
    } else if mean_score < 2.5 {
        ("Moderate Buy", 0.6)
    } else if mean_score < 3.0 {
        ("Hold", 0.5)
    } else if mean_score < 3.5 {
        ("Moderate Sell", 0.4)
    } else {
        ("Sell", 0.2)
    }
}

/// The most recent FMP `upgrades-downgrades` row, kept only when it is
/// an actual rating change (`action` of `upgrade`/`downgrade`).
struct GradeChange {
    company: String,
    new_grade: String,
    previous_grade: String,
    is_upgrade: bool,
}

impl GradeChange {
    fn verb(&self) -> &'static str {
        if self.is_upgrade {
            "upgraded"
        } else {
            "downgraded"
        }
    }
}

/// FMP's `/upgrades-downgrades` rows are newest-first; surface the most
/// recent actual upgrade/downgrade as a bull/bear factor (§4.3).
fn most_recent_grade_change(grades: &Value) -> Option<GradeChange> {
    let row = grades.as_array()?.iter().find(|row| {
        matches!(row.get("action").and_then(Value::as_str), Some("upgrade") | Some("downgrade"))
    })?;
    let action = row.get("action").and_then(Value::as_str)?;
    Some(GradeChange {
        company: row.get("gradingCompany").and_then(Value::as_str).unwrap_or("An analyst").to_string(),
        new_grade: row.get("newGrade").and_then(Value::as_str).unwrap_or("?").to_string(),
        previous_grade: row.get("previousGrade").and_then(Value::as_str).unwrap_or("?").to_string(),
        is_upgrade: action == "upgrade",
    })
}

fn first_row(value: &Value) -> Option<&Value> {
    value.as_array().and_then(|a| a.first())
}

fn pointer_f64(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(Value::as_f64)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries_match_the_table() {
        assert_eq!(bucket_for(1.0).0, "Strong Buy");
        assert_eq!(bucket_for(1.49).0, "Strong Buy");
        assert_eq!(bucket_for(1.5).0, "Buy");
        assert_eq!(bucket_for(2.4).0, "Moderate Buy");
        assert_eq!(bucket_for(2.9).0, "Hold");
        assert_eq!(bucket_for(3.4).0, "Moderate Sell");
        assert_eq!(bucket_for(5.0).0, "Sell");
    }

    #[test]
    fn mean_score_weights_buy_hold_sell() {
        let score = (10.0 * 1.5 + 0.0 * 3.0 + 0.0 * 4.5) / 10.0;
        assert!((score - 1.5).abs() < 1e-9);
    }

    #[test]
    fn sentiment_formula_centers_on_hold() {
        let (_, consensus_signal) = bucket_for(2.75);
        let sentiment = (consensus_signal - 0.5) * 0.6;
        assert!((sentiment - 0.0).abs() < 1e-9);
    }

    #[test]
    fn most_recent_grade_change_skips_maintain_rows() {
        let grades = json!([
            {"action": "maintain", "gradingCompany": "Barclays", "newGrade": "Overweight", "previousGrade": "Overweight"},
            {"action": "upgrade", "gradingCompany": "UBS", "newGrade": "Buy", "previousGrade": "Neutral"},
        ]);
        let change = most_recent_grade_change(&grades).expect("an upgrade row exists");
        assert!(change.is_upgrade);
        assert_eq!(change.company, "UBS");
    }

    #[test]
    fn most_recent_grade_change_none_when_all_maintained() {
        let grades = json!([{"action": "maintain", "gradingCompany": "Barclays", "newGrade": "Overweight", "previousGrade": "Overweight"}]);
        assert!(most_recent_grade_change(&grades).is_none());
    }
}
