//! FRED + sector-ETF macro adapter (§4.3, §4.3a).

use std::time::Duration;

use async_trait::async_trait;
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::{json, Value};

use super::sector_tables::{sector_etf, sector_sensitivity};
use crate::providers::fred::{FredClient, MACRO_SERIES};
use crate::providers::yahoo::YahooClient;

/// FRED-and-sector-ETF-backed macro-context bot (§4.3, §4.3a).
pub struct MacroBot {
    fred: FredClient,
    yahoo: YahooClient,
}

impl MacroBot {
    /// Build the bot from its two provider clients.
    #[must_use]
    pub fn new(fred: FredClient, yahoo: YahooClient) -> Self {
        Self { fred, yahoo }
    }
}

#[async_trait]
impl ResearchBot for MacroBot {
    fn name(&self) -> &'static str {
        "MacroBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(3600)
    }

    async fn fetch(&self, symbol: &str, asset: &AssetMeta) -> BotResult {
        let sector = asset.sector.as_deref().unwrap_or("").to_lowercase();
        let etf = sector_etf(&sector);
        let sensitivity = sector_sensitivity(&sector);

        let momentum = match self.etf_momentum(etf).await {
            Ok(m) => m,
            Err(e) => return BotResult::failed(self.name(), symbol, "yahoo", e.to_string()),
        };

        let mut observations = Vec::with_capacity(MACRO_SERIES.len());
        let mut macro_score = None;
        if let Some(weights) = sensitivity {
            let mut values = Vec::with_capacity(MACRO_SERIES.len());
            let mut all_ok = true;
            for series in MACRO_SERIES {
                match self.fred.observations(series).await {
                    Ok(obs) => {
                        let value = latest_observation_value(&obs);
                        observations.push(json!({"series": series, "value": value}));
                        values.push(value.unwrap_or(0.0));
                    }
                    Err(_) => {
                        all_ok = false;
                        break;
                    }
                }
            }
            if all_ok && values.len() == weights.len() {
                let normalised: Vec<f64> = values.iter().map(|v| (v / 10.0).clamp(-1.0, 1.0)).collect();
                let weighted: f64 = weights.iter().zip(normalised.iter()).map(|(w, v)| w * v).sum();
                macro_score = Some((weighted / weights.len() as f64).clamp(-1.0, 1.0));
            }
        }

        let (sector_flow, confidence) = match macro_score {
            Some(score) => ((0.6 * score + 0.4 * momentum).clamp(-1.0, 1.0), 0.8),
            None => (momentum, 0.5),
        };

        let mut bull_factors = Vec::new();
        let mut bear_factors = Vec::new();
        if sector_flow > 0.2 {
            bull_factors.push(format!("Sector flow favourable vs {etf}"));
        } else if sector_flow < -0.2 {
            bear_factors.push(format!("Sector flow unfavourable vs {etf}"));
        }

        BotResult {
            bot_name: self.name().to_string(),
            ticker: symbol.to_string(),
            signal_inputs: [("sectorFlow".to_string(), round3(sector_flow))].into_iter().collect(),
            bull_factors,
            bear_factors,
            summary: format!("Sector flow {sector_flow:+.2} ({etf} vs SPY momentum {momentum:+.2})"),
            confidence,
            source: "fred+yahoo".to_string(),
            raw: json!({"sector_etf": etf, "observations": observations, "etf_momentum": momentum}),
            error: None,
        }
    }
}

impl MacroBot {
    async fn etf_momentum(&self, etf: &str) -> Result<f64, market_core::ResearchError> {
        let etf_chart = self.yahoo.chart(etf).await?;
        let spy_chart = if etf == "SPY" { etf_chart.clone() } else { self.yahoo.chart("SPY").await? };
        let etf_return = trailing_month_return(&etf_chart).unwrap_or(0.0);
        let spy_return = trailing_month_return(&spy_chart).unwrap_or(0.0);
        Ok(((etf_return - spy_return) * 5.0).clamp(-1.0, 1.0))
    }
}

fn trailing_month_return(chart: &Value) -> Option<f64> {
    let closes = chart
        .pointer("/chart/result/0/indicators/quote/0/close")?
        .as_array()?
        .iter()
        .filter_map(Value::as_f64)
        .collect::<Vec<_>>();
    if closes.len() < 22 {
        return None;
    }
    let last = *closes.last()?;
    let prior = closes[closes.len() - 22];
    if prior.abs() < f64::EPSILON {
        return None;
    }
    Some((last - prior) / prior)
}

fn latest_observation_value(obs: &Value) -> Option<f64> {
    obs.pointer("/observations/0/value")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_return_needs_22_bars() {
        let chart = json!({"chart": {"result": [{"indicators": {"quote": [{"close": [1.0, 2.0]}]}}]}});
        assert_eq!(trailing_month_return(&chart), None);
    }
}
