//! Price/technical-indicator adapter (§4.3, §4.3a).

use std::time::Duration;

use async_trait::async_trait;
use market_core::{AssetMeta, BotResult, ResearchBot};
use serde_json::{json, Value};

use crate::providers::polygon::PolygonClient;
use crate::providers::yahoo::YahooClient;

const NON_US_SUFFIXES: [&str; 8] = [".L", ".PA", ".DE", ".AS", ".TO", ".AX", "=X", "-USD"];

struct Ohlcv {
    closes: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    source: &'static str,
    year_high: Option<f64>,
    year_low: Option<f64>,
}

/// Polygon/Yahoo-backed price-technicals bot (§4.3, §4.3a). Emits no
/// `signal_inputs`; purely factor- and `raw`-producing.
pub struct TechnicalLevelsBot {
    polygon: PolygonClient,
    yahoo: YahooClient,
}

impl TechnicalLevelsBot {
    /// Build the bot from its two provider clients.
    #[must_use]
    pub fn new(polygon: PolygonClient, yahoo: YahooClient) -> Self {
        Self { polygon, yahoo }
    }
}

#[async_trait]
impl ResearchBot for TechnicalLevelsBot {
    fn name(&self) -> &'static str {
        "TechnicalLevelsBot"
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(3600)
    }

    async fn fetch(&self, symbol: &str, _asset: &AssetMeta) -> BotResult {
        let is_us = !NON_US_SUFFIXES.iter().any(|s| symbol.ends_with(s));

        let mut ohlcv = None;
        if is_us {
            ohlcv = self.fetch_polygon(symbol).await;
        }
        if ohlcv.is_none() {
            ohlcv = self.fetch_yahoo(symbol).await;
        }

        let Some(ohlcv) = ohlcv else {
            let mut result = BotResult::failed(self.name(), symbol, "none", "price history unavailable");
            result.error = Some("price history unavailable".to_string());
            return result;
        };

        let Ohlcv { closes, highs, lows, source, year_high, year_low } = ohlcv;
        let current = *closes.last().unwrap();

        let ma20 = moving_average(&closes, 20);
        let ma50 = moving_average(&closes, 50);
        let ma200 = moving_average(&closes, 200);
        let bollinger = bollinger_bands(&closes, 20);

        let window_highs: &[f64] = if highs.len() >= 252 { &highs[highs.len() - 252..] } else { &highs };
        let window_lows: &[f64] = if lows.len() >= 252 { &lows[lows.len() - 252..] } else { &lows };
        let year_high = year_high.unwrap_or_else(|| window_highs.iter().cloned().fold(f64::MIN, f64::max));
        let year_low = year_low.unwrap_or_else(|| window_lows.iter().cloned().fold(f64::MAX, f64::min));
        let year_range = year_high - year_low;
        let year_pos = if year_range > 0.0 { (current - year_low) / year_range * 100.0 } else { 50.0 };

        let (resistance_levels, support_levels) = find_pivots(&highs, &lows, 5);
        let nearest_support = support_levels.iter().filter(|&&s| s < current).cloned().fold(None, max_option).unwrap_or(year_low);
        let nearest_resistance = resistance_levels.iter().filter(|&&r| r > current).cloned().fold(None, min_option).unwrap_or(year_high);
        let support_pct = (current - nearest_support) / current * 100.0;
        let resistance_pct = (nearest_resistance - current) / current * 100.0;

        let (golden_cross, death_cross) = detect_cross(&closes);

        let mut bull_factors = Vec::new();
        let mut bear_factors = Vec::new();

        if year_pos >= 90.0 {
            bull_factors.push(format!("Near 52-week high ({year_pos:.0}th percentile)"));
        } else if year_pos >= 70.0 {
            bull_factors.push(format!("Upper range of 52-week channel ({year_pos:.0}th percentile)"));
        } else if year_pos <= 15.0 {
            bear_factors.push(format!("Near 52-week low ({year_pos:.0}th percentile)"));
        } else if year_pos <= 35.0 {
            bear_factors.push(format!("Lower 52-week range ({year_pos:.0}th percentile)"));
        }

        if let Some(ma50) = ma50 {
            let pct = (current - ma50) / ma50 * 100.0;
            if pct > 0.0 {
                bull_factors.push(format!("Trading {pct:.1}% above MA50"));
            } else {
                bear_factors.push(format!("Trading {:.1}% below MA50", pct.abs()));
            }
        }
        if let Some(ma200) = ma200 {
            if current > ma200 {
                bull_factors.push("Above 200-day MA — long-term uptrend intact".to_string());
            } else {
                bear_factors.push("Below 200-day MA — long-term downtrend".to_string());
            }
        }
        if golden_cross {
            bull_factors.push("Golden cross (MA50 > MA200) — strong technical buy signal".to_string());
        }
        if death_cross {
            bear_factors.push("Death cross (MA50 < MA200) — strong technical sell signal".to_string());
        }
        if support_pct < 3.0 {
            bull_factors.push(format!("Near support at {nearest_support:.2}"));
        } else if resistance_pct > 15.0 {
            bull_factors.push(format!("Clear runway to resistance at {nearest_resistance:.2} (+{resistance_pct:.1}%)"));
        }
        if resistance_pct < 3.0 {
            bear_factors.push(format!("Near resistance at {nearest_resistance:.2}"));
        }
        if let Some((upper, _, lower)) = bollinger {
            if current > upper {
                bear_factors.push("Above upper Bollinger Band — overbought".to_string());
            } else if current < lower {
                bull_factors.push("Below lower Bollinger Band — oversold".to_string());
            }
        }

        if bull_factors.is_empty() {
            bull_factors.push("No major technical resistance nearby".to_string());
        }
        if bear_factors.is_empty() {
            bear_factors.push(format!("Support at {nearest_support:.2} ({support_pct:.1}% downside)"));
        }

        bull_factors.truncate(4);
        bear_factors.truncate(4);

        let trend = if ma50.is_some_and(|m| current > m) { "uptrend" } else { "downtrend" };
        let mut summary = format!("{year_pos:.0}th percentile 52wk · {trend} · {source}");
        if golden_cross {
            summary.push_str(" · golden cross");
        }
        if death_cross {
            summary.push_str(" · death cross");
        }

        BotResult {
            bot_name: self.name().to_string(),
            ticker: symbol.to_string(),
            signal_inputs: std::collections::HashMap::new(),
            bull_factors,
            bear_factors,
            summary,
            confidence: 0.8,
            source: source.to_string(),
            raw: json!({
                "current": current,
                "ma20": ma20, "ma50": ma50, "ma200": ma200,
                "year_high": year_high, "year_low": year_low,
                "year_position_pct": round1(year_pos),
                "nearest_support": round2(nearest_support),
                "nearest_resistance": round2(nearest_resistance),
                "golden_cross": golden_cross, "death_cross": death_cross,
            }),
            error: None,
        }
    }
}

impl TechnicalLevelsBot {
    async fn fetch_polygon(&self, symbol: &str) -> Option<Ohlcv> {
        let body = self.polygon.daily_aggregates(symbol).await.ok()?;
        let results = body.get("results")?.as_array()?;
        if results.len() < 50 {
            return None;
        }
        let closes = results.iter().filter_map(|b| b.get("c").and_then(Value::as_f64)).collect::<Vec<_>>();
        let highs = results.iter().filter_map(|b| b.get("h").and_then(Value::as_f64)).collect::<Vec<_>>();
        let lows = results.iter().filter_map(|b| b.get("l").and_then(Value::as_f64)).collect::<Vec<_>>();
        Some(Ohlcv { closes, highs, lows, source: "Polygon", year_high: None, year_low: None })
    }

    async fn fetch_yahoo(&self, symbol: &str) -> Option<Ohlcv> {
        let body = self.yahoo.chart(symbol).await.ok()?;
        let result = body.pointer("/chart/result/0")?;
        let quote = result.pointer("/indicators/quote/0")?;
        let closes = quote.get("close")?.as_array()?.iter().filter_map(Value::as_f64).collect::<Vec<_>>();
        let highs = quote.get("high")?.as_array()?.iter().filter_map(Value::as_f64).collect::<Vec<_>>();
        let lows = quote.get("low")?.as_array()?.iter().filter_map(Value::as_f64).collect::<Vec<_>>();
        if closes.len() < 50 {
            return None;
        }
        let year_high = result.pointer("/meta/fiftyTwoWeekHigh").and_then(Value::as_f64);
        let year_low = result.pointer("/meta/fiftyTwoWeekLow").and_then(Value::as_f64);
        Some(Ohlcv { closes, highs, lows, source: "Yahoo Finance", year_high, year_low })
    }
}

fn moving_average(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < period {
        return None;
    }
    Some(prices[prices.len() - period..].iter().sum::<f64>() / period as f64)
}

fn bollinger_bands(prices: &[f64], period: usize) -> Option<(f64, f64, f64)> {
    if prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    let mid = window.iter().sum::<f64>() / period as f64;
    let variance = window.iter().map(|p| (p - mid).powi(2)).sum::<f64>() / period as f64;
    let std = variance.sqrt();
    Some((mid + 2.0 * std, mid, mid - 2.0 * std))
}

fn find_pivots(highs: &[f64], lows: &[f64], window: usize) -> (Vec<f64>, Vec<f64>) {
    let mut resistance = Vec::new();
    let mut support = Vec::new();
    if highs.len() <= 2 * window {
        return (resistance, support);
    }
    for i in window..highs.len() - window {
        let is_resistance = (1..=window).all(|j| highs[i] >= highs[i - j] && highs[i] >= highs[i + j]);
        if is_resistance {
            resistance.push(highs[i]);
        }
        let is_support = (1..=window).all(|j| lows[i] <= lows[i - j] && lows[i] <= lows[i + j]);
        if is_support {
            support.push(lows[i]);
        }
    }
    let resistance = resistance.split_off(resistance.len().saturating_sub(3));
    let support = support.split_off(support.len().saturating_sub(3));
    (resistance, support)
}

fn detect_cross(closes: &[f64]) -> (bool, bool) {
    if closes.len() < 2 {
        return (false, false);
    }
    let ma50 = moving_average(closes, 50);
    let ma200 = moving_average(closes, 200);
    let prior = &closes[..closes.len() - 1];
    let prev_ma50 = moving_average(prior, 50);
    let prev_ma200 = moving_average(prior, 200);
    match (ma50, ma200, prev_ma50, prev_ma200) {
        (Some(ma50), Some(ma200), Some(prev50), Some(prev200)) => {
            if prev50 < prev200 && ma50 > ma200 {
                (true, false)
            } else if prev50 > prev200 && ma50 < ma200 {
                (false, true)
            } else {
                (false, false)
            }
        }
        _ => (false, false),
    }
}

fn max_option(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.max(v)))
}

fn min_option(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_cross_fires_when_ma50_crosses_above_ma200_on_final_bar() {
        // A gentle decline keeps the prior-window MA50 below the prior-window
        // MA200 (more recent values are lower); a final huge spike pulls the
        // 50-bar average far above the 200-bar average, which only dilutes
        // it by a quarter as much, flipping the relation on the last bar.
        let mut closes: Vec<f64> = (0..249).map(|i| 100.0 - i as f64 * 0.01).collect();
        closes.push(1_000_000.0);
        let (golden, death) = detect_cross(&closes);
        assert!(golden);
        assert!(!death);
    }

    #[test]
    fn no_cross_when_prior_relation_already_holds() {
        let closes = vec![100.0; 250];
        let (golden, death) = detect_cross(&closes);
        assert!(!golden);
        assert!(!death);
    }

    #[test]
    fn pivots_need_window_on_both_sides() {
        let highs = vec![1.0, 2.0, 3.0, 10.0, 3.0, 2.0, 1.0];
        let lows = highs.clone();
        let (resistance, _support) = find_pivots(&highs, &lows, 3);
        assert_eq!(resistance, vec![10.0]);
    }
}
