//! SEC EDGAR Form-4 insider-activity adapter (§4.3, §4.3a).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::{json, Value};

use crate::providers::sec_edgar::SecEdgarClient;

const NON_US_SUFFIXES: [&str; 6] = [".L", ".PA", ".DE", ".AS", ".TO", ".AX"];

fn role_weight(role: &str) -> f64 {
    let role = role.to_lowercase();
    if role.contains("ceo") || role.contains("chief executive") {
        2.0
    } else if role.contains("cfo") || role.contains("chief financial") {
        1.8
    } else if role.contains("chairman") {
        1.8
    } else if role.contains("coo") || role.contains("chief operating") {
        1.6
    } else if role.contains("president") {
        1.6
    } else if role.contains("evp") || role.contains("executive vice president") {
        1.3
    } else if role.contains("director") {
        1.4
    } else if role.contains("svp") || role.contains("senior vice president") {
        1.2
    } else if role.contains("vp") || role.contains("vice president") {
        1.0
    } else {
        1.0
    }
}

fn recency_weight(days_ago: i64) -> f64 {
    if days_ago <= 30 {
        1.0
    } else if days_ago <= 60 {
        0.7
    } else if days_ago <= 90 {
        0.4
    } else {
        0.6
    }
}

/// SEC-EDGAR-backed insider-transaction bot (§4.3, §4.3a).
pub struct InsiderBot {
    sec_edgar: SecEdgarClient,
}

impl InsiderBot {
    /// Build the bot from its provider client.
    #[must_use]
    pub fn new(sec_edgar: SecEdgarClient) -> Self {
        Self { sec_edgar }
    }
}

#[async_trait]
impl ResearchBot for InsiderBot {
    fn name(&self) -> &'static str {
        "InsiderBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(6 * 3600)
    }

    async fn fetch(&self, symbol: &str, _asset: &AssetMeta) -> BotResult {
        if NON_US_SUFFIXES.iter().any(|s| symbol.ends_with(s)) {
            return BotResult {
                bot_name: self.name().to_string(),
                ticker: symbol.to_string(),
                signal_inputs: [("insiderBuy".to_string(), 0.5)].into_iter().collect(),
                bull_factors: Vec::new(),
                bear_factors: Vec::new(),
                summary: "Non-US listing; insider filings not tracked".to_string(),
                confidence: 0.5,
                source: "sec_edgar".to_string(),
                raw: Value::Null,
                error: None,
            };
        }

        let filings = match self.sec_edgar.search_form4(symbol).await {
            Ok(body) => body,
            Err(e) => return BotResult::failed(self.name(), symbol, "sec_edgar", e.to_string()),
        };

        let hits = filings.pointer("/hits/hits").and_then(Value::as_array).cloned().unwrap_or_default();

        if hits.is_empty() {
            let mut result = BotResult::failed(self.name(), symbol, "sec_edgar", "no Form 4 filings in window");
            result.error = None;
            result.confidence = 0.4;
            result.signal_inputs.insert("insiderBuy".to_string(), 0.5);
            result.summary = "No recent insider filings.".to_string();
            return result;
        }

        let today = Utc::now().date_naive();
        let mut buy_score = 0.0_f64;
        let mut sell_score = 0.0_f64;
        let mut buyers = HashSet::new();
        let mut bull_factors = Vec::new();
        let mut bear_factors = Vec::new();

        for hit in &hits {
            let source = hit.get("_source").unwrap_or(&Value::Null);
            let role = source.get("role").and_then(Value::as_str).unwrap_or("officer");
            let filer = source.get("display_names").and_then(Value::as_array).and_then(|a| a.first()).and_then(Value::as_str).unwrap_or("unknown");
            let filed_date = source
                .get("file_date")
                .and_then(Value::as_str)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let days_ago = filed_date.map(|d| (today - d).num_days()).unwrap_or(90);
            let is_buy = source.get("transaction_code").and_then(Value::as_str).map(|c| c == "P").unwrap_or(true);

            let weight = role_weight(role) * recency_weight(days_ago);
            if is_buy {
                buy_score += weight;
                buyers.insert(filer.to_string());
                bull_factors.push(format!("{filer} ({role}) bought shares"));
            } else {
                sell_score += weight;
                bear_factors.push(format!("{filer} ({role}) sold shares"));
            }
        }

        let cluster_bonus = if buyers.len() >= 3 { 0.15 } else { 0.0 };
        let total = buy_score + sell_score;
        let insider_buy = if total.abs() < f64::EPSILON {
            0.5
        } else {
            (buy_score / total + cluster_bonus).clamp(0.0, 1.0)
        };

        bull_factors.truncate(6);
        bear_factors.truncate(6);

        BotResult {
            bot_name: self.name().to_string(),
            ticker: symbol.to_string(),
            signal_inputs: [("insiderBuy".to_string(), round3(insider_buy))].into_iter().collect(),
            bull_factors,
            bear_factors,
            summary: format!("{} Form 4 filings in last 90 days", hits.len()),
            confidence: 0.8,
            source: "sec_edgar".to_string(),
            raw: json!({"filing_count": hits.len(), "distinct_buyers": buyers.len()}),
            error: None,
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_weights_match_table() {
        assert_eq!(role_weight("Chief Executive Officer"), 2.0);
        assert_eq!(role_weight("CFO"), 1.8);
        assert_eq!(role_weight("Director"), 1.4);
        assert_eq!(role_weight("VP Sales"), 1.0);
        assert_eq!(role_weight("Senior Advisor"), 1.0);
    }

    #[test]
    fn recency_buckets_match_table() {
        assert_eq!(recency_weight(10), 1.0);
        assert_eq!(recency_weight(45), 0.7);
        assert_eq!(recency_weight(75), 0.4);
        assert_eq!(recency_weight(120), 0.6);
    }
}
