//! Next-earnings-date/EPS-surprise adapter (§4.3).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use market_core::{AssetMeta, BotResult, ResearchError, ResearchBot};
use serde_json::{json, Value};

use crate::providers::alpha_vantage::AlphaVantageClient;
use crate::providers::fmp::FmpClient;
use crate::providers::yahoo::YahooClient;

const UK_SUFFIXES: [&str; 2] = [".L", ".IL"];

/// FMP/Yahoo/Alpha-Vantage-backed earnings-calendar and EPS-surprise bot (§4.3).
pub struct EarningsBot {
    fmp: FmpClient,
    yahoo: YahooClient,
    alpha_vantage: AlphaVantageClient,
}

impl EarningsBot {
    /// Build the bot from its three provider clients.
    #[must_use]
    pub fn new(fmp: FmpClient, yahoo: YahooClient, alpha_vantage: AlphaVantageClient) -> Self {
        Self { fmp, yahoo, alpha_vantage }
    }
}

#[async_trait]
impl ResearchBot for EarningsBot {
    fn name(&self) -> &'static str {
        "EarningsBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(4 * 3600)
    }

    async fn fetch(&self, symbol: &str, _asset: &AssetMeta) -> BotResult {
        let is_uk = UK_SUFFIXES.iter().any(|s| symbol.ends_with(s));

        let providers_in_order: &[&str] = if is_uk { &["fmp", "yahoo", "alpha_vantage"] } else { &["yahoo", "fmp", "alpha_vantage"] };

        let mut last_err = None;
        for provider in providers_in_order {
            let outcome = match *provider {
                "fmp" => self.fetch_fmp(symbol).await,
                "yahoo" => self.fetch_yahoo(symbol).await,
                "alpha_vantage" => self.fetch_alpha_vantage(symbol).await,
                _ => unreachable!(),
            };
            match outcome {
                Ok(result) => return result,
                Err(e) => last_err = Some(e),
            }
        }

        BotResult::failed(
            self.name(),
            symbol,
            "none",
            last_err.map(|e| e.to_string()).unwrap_or_else(|| "all earnings providers failed".to_string()),
        )
    }
}

impl EarningsBot {
    async fn fetch_fmp(&self, symbol: &str) -> Result<BotResult, ResearchError> {
        let calendar = self.fmp.earnings_calendar(symbol).await?;
        let surprises = self.fmp.earnings_surprises(symbol).await?;
        let days_to_earnings = next_earnings_days(&calendar, symbol)
            .ok_or_else(|| ResearchError::parse("fmp", "no upcoming earnings date"))?;
        let series = eps_surprise_series_fmp(&surprises);
        Ok(build_result(symbol, "fmp", days_to_earnings, &series, json!({"calendar": calendar, "surprises": surprises})))
    }

    async fn fetch_yahoo(&self, symbol: &str) -> Result<BotResult, ResearchError> {
        let summary = self
            .yahoo
            .quote_summary(symbol, &["calendarEvents", "earningsHistory"])
            .await?;
        let days_to_earnings = yahoo_days_to_earnings(&summary)
            .ok_or_else(|| ResearchError::parse("yahoo", "no earningsDate in calendarEvents"))?;
        let series = yahoo_surprise_series(&summary);
        Ok(build_result(symbol, "yahoo", days_to_earnings, &series, summary))
    }

    async fn fetch_alpha_vantage(&self, symbol: &str) -> Result<BotResult, ResearchError> {
        let earnings = self.alpha_vantage.earnings(symbol).await?;
        let series = alpha_vantage_surprise_series(&earnings);
        // Alpha Vantage's EARNINGS function carries no forward-looking date; 90 = unknown/cap.
        Ok(build_result(symbol, "alpha_vantage", 90.0, &series, earnings))
    }
}

/// `series` holds the last up-to-4 quarterly EPS surprise percentages,
/// most recent first. Builds the mean-surprise signal input plus
/// beat-/miss-streak factor text from the same series (§4.3 EarningsBot).
fn build_result(symbol: &str, source: &str, days_to_earnings: f64, series: &[f64], raw: Value) -> BotResult {
    let days_to_earnings = days_to_earnings.clamp(0.0, 90.0);
    let beat_pct = mean(series).clamp(-25.0, 40.0);

    let mut bull_factors = Vec::new();
    let mut bear_factors = Vec::new();
    if beat_pct > 5.0 {
        bull_factors.push(format!("Average EPS beat of {beat_pct:.1}% over last 4 quarters"));
    } else if beat_pct < -5.0 {
        bear_factors.push(format!("Average EPS miss of {:.1}% over last 4 quarters", beat_pct.abs()));
    }
    match streak(series) {
        Streak::Beat(n) if n >= 2 => bull_factors.push(format!("Beat EPS estimates {n} consecutive quarters")),
        Streak::Miss(n) if n >= 2 => bear_factors.push(format!("Missed EPS estimates {n} consecutive quarters")),
        _ => {}
    }
    if days_to_earnings <= 7.0 {
        bull_factors.push(format!("Earnings in {days_to_earnings:.0} days"));
    }

    BotResult {
        bot_name: "EarningsBot".to_string(),
        ticker: symbol.to_string(),
        signal_inputs: [
            ("daysToEarnings".to_string(), round3(days_to_earnings)),
            ("earningsBeat".to_string(), round3(beat_pct)),
        ]
        .into_iter()
        .collect(),
        bull_factors,
        bear_factors,
        summary: format!("Next earnings in {days_to_earnings:.0} days, avg surprise {beat_pct:+.1}%"),
        confidence: 0.8,
        source: source.to_string(),
        raw,
        error: None,
    }
}

fn next_earnings_days(calendar: &Value, symbol: &str) -> Option<f64> {
    let today = Utc::now().date_naive();
    calendar
        .as_array()?
        .iter()
        .filter(|row| row.get("symbol").and_then(Value::as_str) == Some(symbol))
        .filter_map(|row| row.get("date").and_then(Value::as_str))
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .filter(|d| *d >= today)
        .min()
        .map(|d| (d - today).num_days() as f64)
}

fn eps_surprise_series_fmp(surprises: &Value) -> Vec<f64> {
    let rows = surprises.as_array().map(Vec::as_slice).unwrap_or(&[]);
    rows.iter()
        .take(4)
        .filter_map(|row| {
            let actual = row.get("actualEarningResult").and_then(Value::as_f64)?;
            let estimated = row.get("estimatedEarning").and_then(Value::as_f64)?;
            if estimated.abs() < f64::EPSILON {
                None
            } else {
                Some((actual - estimated) / estimated.abs() * 100.0)
            }
        })
        .collect()
}

fn yahoo_days_to_earnings(summary: &Value) -> Option<f64> {
    let today = Utc::now();
    let ts = summary
        .pointer("/quoteSummary/result/0/calendarEvents/earningsDate/0/raw")
        .and_then(Value::as_i64)?;
    let earnings_at = chrono::DateTime::from_timestamp(ts, 0)?;
    Some((earnings_at - today).num_days() as f64)
}

fn yahoo_surprise_series(summary: &Value) -> Vec<f64> {
    let Some(history) = summary.pointer("/quoteSummary/result/0/earningsHistory/history").and_then(Value::as_array) else {
        return Vec::new();
    };
    history
        .iter()
        .take(4)
        .filter_map(|row| row.pointer("/surprisePercent/raw").and_then(Value::as_f64))
        .map(|frac| frac * 100.0)
        .collect()
}

fn alpha_vantage_surprise_series(earnings: &Value) -> Vec<f64> {
    let Some(rows) = earnings.get("quarterlyEarnings").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .take(4)
        .filter_map(|row| row.get("surprisePercentage").and_then(Value::as_str))
        .filter_map(|s| s.parse::<f64>().ok())
        .collect()
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    }
}

/// Consecutive beats/misses counted from the most recent quarter
/// (`series[0]`) backward, stopping at the first sign flip.
enum Streak {
    Beat(usize),
    Miss(usize),
    None,
}

fn streak(series: &[f64]) -> Streak {
    let Some(&first) = series.first() else { return Streak::None };
    if first > 0.0 {
        Streak::Beat(series.iter().take_while(|v| **v > 0.0).count())
    } else if first < 0.0 {
        Streak::Miss(series.iter().take_while(|v| **v < 0.0).count())
    } else {
        Streak::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fmp_mean_surprise_averages_last_four() {
        let surprises = json!([
            {"actualEarningResult": 1.1, "estimatedEarning": 1.0},
            {"actualEarningResult": 0.9, "estimatedEarning": 1.0},
        ]);
        let series = eps_surprise_series_fmp(&surprises);
        assert!((mean(&series) - 0.0).abs() < 1.0);
    }

    #[test]
    fn beat_streak_stops_at_first_miss() {
        assert!(matches!(streak(&[4.0, 2.0, -1.0, 3.0]), Streak::Beat(2)));
    }

    #[test]
    fn miss_streak_counts_consecutive_negatives() {
        assert!(matches!(streak(&[-3.0, -1.0, -2.0]), Streak::Miss(3)));
    }

    #[test]
    fn clamps_at_build_time() {
        let result = build_result("AAPL", "yahoo", 200.0, &[500.0, 500.0], json!({}));
        assert_eq!(result.signal_inputs["daysToEarnings"], 90.0);
        assert_eq!(result.signal_inputs["earningsBeat"], 40.0);
    }
}
