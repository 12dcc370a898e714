//! Sector fundamentals adapter (§4.3, §4.3a).

use std::time::Duration;

use async_trait::async_trait;
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::{json, Value};

use super::sector_tables::sector_average_pe;
use crate::providers::fmp::FmpClient;
use crate::providers::yahoo::YahooClient;

/// FMP/Yahoo-backed fundamentals bot (§4.3, §4.3a).
pub struct FundamentalsBot {
    fmp: FmpClient,
    yahoo: YahooClient,
}

impl FundamentalsBot {
    /// Build the bot from its two provider clients.
    #[must_use]
    pub fn new(fmp: FmpClient, yahoo: YahooClient) -> Self {
        Self { fmp, yahoo }
    }
}

#[async_trait]
impl ResearchBot for FundamentalsBot {
    fn name(&self) -> &'static str {
        "FundamentalsBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(4 * 3600)
    }

    async fn fetch(&self, symbol: &str, asset: &AssetMeta) -> BotResult {
        let fmp_metrics = self.fmp.key_metrics_ttm(symbol).await.ok();
        let fmp_growth = self.fmp.financial_growth(symbol).await.ok();
        let yahoo_summary = if fmp_metrics.is_none() {
            self.yahoo
                .quote_summary(symbol, &["defaultKeyStatistics", "financialData", "summaryDetail"])
                .await
                .ok()
        } else {
            None
        };

        if fmp_metrics.is_none() && yahoo_summary.is_none() {
            return BotResult::failed(self.name(), symbol, "fmp+yahoo", "no fundamentals data available");
        }

        let rev_growth = fmp_growth
            .as_ref()
            .and_then(|g| first_row(g))
            .and_then(|row| row.get("revenueGrowth").and_then(Value::as_f64))
            .or_else(|| yahoo_summary.as_ref().and_then(|s| pointer_f64(s, "/quoteSummary/result/0/financialData/revenueGrowth/raw")))
            .map(normalise_to_percent);

        let debt_ratio = fmp_metrics
            .as_ref()
            .and_then(first_row)
            .and_then(|row| row.get("debtToEquityTTM").and_then(Value::as_f64))
            .or_else(|| yahoo_summary.as_ref().and_then(|s| pointer_f64(s, "/quoteSummary/result/0/financialData/debtToEquity/raw")))
            .unwrap_or(0.0)
            .max(0.0);

        let short_int = yahoo_summary
            .as_ref()
            .and_then(|s| pointer_f64(s, "/quoteSummary/result/0/defaultKeyStatistics/shortPercentOfFloat/raw"))
            .map(normalise_to_percent)
            .unwrap_or(0.0);

        let pe = fmp_metrics
            .as_ref()
            .and_then(first_row)
            .and_then(|row| row.get("peRatioTTM").and_then(Value::as_f64))
            .or_else(|| yahoo_summary.as_ref().and_then(|s| pointer_f64(s, "/quoteSummary/result/0/summaryDetail/trailingPE/raw")));

        let sector = asset.sector.as_deref().unwrap_or("").to_lowercase();
        let sector_pe = sector_average_pe(&sector);

        let roe = fmp_metrics
            .as_ref()
            .and_then(first_row)
            .and_then(|row| row.get("roeTTM").and_then(Value::as_f64))
            .map(normalise_to_percent);

        let current_ratio = fmp_metrics
            .as_ref()
            .and_then(first_row)
            .and_then(|row| row.get("currentRatioTTM").and_then(Value::as_f64));

        let mut bull_factors = Vec::new();
        let mut bear_factors = Vec::new();

        if let Some(rg) = rev_growth {
            if rg > 15.0 {
                bull_factors.push(format!("Revenue growth {rg:.1}% YoY"));
            } else if rg < 0.0 {
                bear_factors.push(format!("Revenue declining {:.1}% YoY", rg.abs()));
            }
        }
        if let Some(p) = pe {
            if p > 0.0 && p < sector_pe * 0.8 {
                bull_factors.push(format!("P/E {p:.1} below sector average {sector_pe:.0}"));
            } else if p > sector_pe * 1.3 {
                bear_factors.push(format!("P/E {p:.1} above sector average {sector_pe:.0}"));
            }
        }
        if let Some(r) = roe {
            if r > 20.0 {
                bull_factors.push(format!("Strong ROE {r:.1}%"));
            }
        }
        if debt_ratio > 2.0 {
            bear_factors.push(format!("High debt/equity {debt_ratio:.2}"));
        }
        if let Some(cr) = current_ratio {
            if cr < 1.0 {
                bear_factors.push(format!("Current ratio below 1.0 ({cr:.2})"));
            }
        }
        if short_int > 10.0 {
            bear_factors.push(format!("Short interest elevated at {short_int:.1}%"));
        }

        bull_factors.truncate(6);
        bear_factors.truncate(6);

        let confidence = if rev_growth.is_some() { 0.85 } else { 0.5 };

        BotResult {
            bot_name: self.name().to_string(),
            ticker: symbol.to_string(),
            signal_inputs: [
                ("revGrowth".to_string(), round3(rev_growth.unwrap_or(0.0))),
                ("shortInt".to_string(), round3(short_int)),
                ("debtRatio".to_string(), round3(debt_ratio)),
            ]
            .into_iter()
            .collect(),
            bull_factors,
            bear_factors,
            summary: format!("Sector avg P/E {sector_pe:.0}, rev growth {:+.1}%", rev_growth.unwrap_or(0.0)),
            confidence,
            source: if fmp_metrics.is_some() { "fmp".to_string() } else { "yahoo".to_string() },
            raw: json!({"pe": pe, "sector_average_pe": sector_pe, "roe": roe, "current_ratio": current_ratio}),
            error: None,
        }
    }
}

fn first_row(value: &Value) -> Option<&Value> {
    value.as_array().and_then(|a| a.first())
}

fn pointer_f64(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(Value::as_f64)
}

/// FMP and Yahoo disagree on whether growth/ratio fields are fractions
/// (`0.12`) or already percent (`12.0`); anything with `|x| < 1` in a
/// percent-shaped field is assumed to be the fractional form and is
/// rescaled.
fn normalise_to_percent(value: f64) -> f64 {
    if value.abs() < 1.0 {
        value * 100.0
    } else {
        value
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_fractional_growth_to_percent() {
        assert_eq!(normalise_to_percent(0.12), 12.0);
        assert_eq!(normalise_to_percent(12.0), 12.0);
    }
}
