//! Dynamic classification of assets into sweep-frequency tiers (§4.8).

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Sweep-frequency tier. Lower numbers sweep more often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Swept by nearly every scheduled job.
    One,
    /// Swept by the broader, less frequent jobs.
    Two,
    /// Swept only by the weekly catch-all job.
    Three,
}

/// Static Tier-1 seed list (~60 high-priority tickers): US megacaps, the
/// major UK/EU blue chips, and the most liquid crypto pairs.
pub const TIER1_STATIC: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "BRK-B", "JPM", "V",
    "UNH", "XOM", "JNJ", "WMT", "MA", "PG", "HD", "CVX", "MRK", "ABBV",
    "KO", "PEP", "COST", "AVGO", "BAC", "ADBE", "CRM", "NFLX", "AMD", "DIS",
    "TMO", "CSCO", "ORCL", "ACN", "LIN", "ABT", "MCD", "WFC", "DHR", "INTC",
    "BP.L", "SHEL.L", "AZN.L", "HSBA.L", "ULVR.L", "GSK.L", "RIO.L", "DGE.L",
    "SAP.DE", "SIE.DE", "ALV.DE", "MC.PA", "OR.PA", "TTE.PA", "ASML.AS",
    "BTC-USD", "ETH-USD", "SOL-USD", "XRP-USD", "BNB-USD", "DOGE-USD",
];

/// Static Tier-2 seed list (~90 tickers): broader US large/mid-caps, a
/// wider UK/EU set, curated commodity/forex instruments, and the Asian
/// ADRs the overnight job covers.
pub const TIER2_STATIC: &[&str] = &[
    "PYPL", "QCOM", "TXN", "HON", "UPS", "LOW", "SBUX", "IBM", "CAT", "GE",
    "BA", "MMM", "GS", "MS", "AXP", "BLK", "SPGI", "NOW", "INTU", "AMAT",
    "ISRG", "BKNG", "GILD", "LRCX", "ADI", "MDLZ", "VRTX", "REGN", "PANW", "SNPS",
    "CDNS", "KLAC", "MU", "PLD", "SCHW", "CB", "TJX", "ETN", "SYK", "ZTS",
    "BSX", "APH", "CMG", "MO", "CI", "SO", "DUK", "PGR", "ITW", "EOG",
    "LLOY.L", "BARC.L", "VOD.L", "BT-A.L", "NG.L", "PRU.L", "STAN.L", "AAL.L",
    "BAS.DE", "BMW.DE", "VOW3.DE", "DTE.DE", "BAYN.DE", "ADS.DE",
    "AIR.PA", "BNP.PA", "SAN.PA", "CS.PA", "SU.PA",
    "PHIA.AS", "INGA.AS", "ADYEN.AS",
    "GLD", "SLV", "USO", "UNG", "DBA", "CPER", "UUP",
    "EURUSD=X", "GBPUSD=X", "USDJPY=X", "AUDUSD=X", "USDCAD=X", "USDCHF=X", "NZDUSD=X",
    "TSM", "BABA", "JD", "PDD", "TCEHY", "BIDU", "NTES", "SONY", "TM", "HMC",
    "ADA-USD", "AVAX-USD", "DOT-USD", "MATIC-USD", "LTC-USD",
];

/// In-memory, dynamically-updated classification of symbols into tiers.
///
/// Seeded on startup from [`TIER1_STATIC`]/[`TIER2_STATIC`]; rebuilt
/// from those seeds plus a persisted watchlist on every restart (§3.3).
/// Tier-1 membership always wins — a symbol is never enumerated in more
/// than one tier, even if a static list names it twice (§9).
pub struct PriorityManager {
    inner: RwLock<Inner>,
}

struct Inner {
    tier1: HashSet<String>,
    tier2: HashSet<String>,
    tier3: HashSet<String>,
    view_counts: HashMap<String, u32>,
    watchlist: HashSet<String>,
}

/// Snapshot of tier membership counts, for the admin/status surface.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct PrioritySummary {
    /// Number of symbols currently in tier 1.
    pub tier1: usize,
    /// Number of symbols currently in tier 2.
    pub tier2: usize,
    /// Number of symbols currently in tier 3.
    pub tier3: usize,
    /// Number of symbols on the watchlist.
    pub watchlist: usize,
}

impl Default for PriorityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityManager {
    /// Construct a manager seeded from the static Tier-1/Tier-2 lists.
    #[must_use]
    pub fn new() -> Self {
        let mut tier1: HashSet<String> = TIER1_STATIC.iter().map(|s| (*s).to_string()).collect();
        let mut tier2: HashSet<String> = TIER2_STATIC.iter().map(|s| (*s).to_string()).collect();
        // Tier-1 wins when the static seeds overlap (§9).
        tier2.retain(|s| !tier1.contains(s));
        tier1.shrink_to_fit();

        Self {
            inner: RwLock::new(Inner {
                tier1,
                tier2,
                tier3: HashSet::new(),
                view_counts: HashMap::new(),
                watchlist: HashSet::new(),
            }),
        }
    }

    /// Replace the watchlist, unioning its members into Tier-1 and
    /// removing them from Tier-2/Tier-3.
    pub fn set_watchlist(&self, symbols: &[String]) {
        let mut inner = self.inner.write().expect("priority manager lock poisoned");
        inner.watchlist = symbols.iter().cloned().collect();
        for symbol in symbols {
            inner.tier2.remove(symbol);
            inner.tier3.remove(symbol);
            inner.tier1.insert(symbol.clone());
        }
    }

    /// Record a view of `symbol`, promoting on the view-count thresholds
    /// (≥3 views → Tier-1, ≥1 view → Tier-2).
    pub fn record_view(&self, symbol: &str) {
        let mut inner = self.inner.write().expect("priority manager lock poisoned");
        let count = inner.view_counts.entry(symbol.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        if count >= 3 {
            inner.tier2.remove(symbol);
            inner.tier3.remove(symbol);
            inner.tier1.insert(symbol.to_string());
        } else if count >= 1 && !inner.tier1.contains(symbol) {
            inner.tier3.remove(symbol);
            inner.tier2.insert(symbol.to_string());
        }
    }

    /// Explicitly move `symbol` into `tier`, maintaining the
    /// at-most-one-tier invariant with Tier-1 precedence.
    pub fn promote(&self, symbol: &str, tier: Tier) {
        let mut inner = self.inner.write().expect("priority manager lock poisoned");
        inner.tier1.remove(symbol);
        inner.tier2.remove(symbol);
        inner.tier3.remove(symbol);
        match tier {
            Tier::One => {
                inner.tier1.insert(symbol.to_string());
            }
            Tier::Two => {
                inner.tier2.insert(symbol.to_string());
            }
            Tier::Three => {
                inner.tier3.insert(symbol.to_string());
            }
        }
    }

    /// Any symbol from the universe feed not already in Tier-1/Tier-2 joins Tier-3.
    pub fn load_universe(&self, symbols: &[String]) {
        let mut inner = self.inner.write().expect("priority manager lock poisoned");
        for symbol in symbols {
            if !inner.tier1.contains(symbol) && !inner.tier2.contains(symbol) {
                inner.tier3.insert(symbol.clone());
            }
        }
    }

    /// Ordered (sorted) list of Tier-1 symbols.
    #[must_use]
    pub fn get_tier1(&self) -> Vec<String> {
        sorted(&self.inner.read().expect("priority manager lock poisoned").tier1)
    }

    /// Ordered (sorted) list of Tier-2 symbols.
    #[must_use]
    pub fn get_tier2(&self) -> Vec<String> {
        sorted(&self.inner.read().expect("priority manager lock poisoned").tier2)
    }

    /// Ordered (sorted) list of Tier-3 symbols.
    #[must_use]
    pub fn get_tier3(&self) -> Vec<String> {
        sorted(&self.inner.read().expect("priority manager lock poisoned").tier3)
    }

    /// All symbols across all tiers, Tier-1 first, each segment sorted.
    #[must_use]
    pub fn get_all_ordered(&self) -> Vec<String> {
        let inner = self.inner.read().expect("priority manager lock poisoned");
        let mut all = sorted(&inner.tier1);
        all.extend(sorted(&inner.tier2));
        all.extend(sorted(&inner.tier3));
        all
    }

    /// Snapshot of membership counts.
    #[must_use]
    pub fn summary(&self) -> PrioritySummary {
        let inner = self.inner.read().expect("priority manager lock poisoned");
        PrioritySummary {
            tier1: inner.tier1.len(),
            tier2: inner.tier2.len(),
            tier3: inner.tier3.len(),
            watchlist: inner.watchlist.len(),
        }
    }
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut v: Vec<String> = set.iter().cloned().collect();
    v.sort();
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_disjoint() {
        let pm = PriorityManager::new();
        let t1: HashSet<_> = pm.get_tier1().into_iter().collect();
        let t2: HashSet<_> = pm.get_tier2().into_iter().collect();
        assert!(t1.is_disjoint(&t2));
    }

    #[test]
    fn watchlist_promotes_to_tier1() {
        let pm = PriorityManager::new();
        pm.promote("XYZ", Tier::Two);
        pm.set_watchlist(&["XYZ".to_string()]);
        assert!(pm.get_tier1().contains(&"XYZ".to_string()));
        assert!(!pm.get_tier2().contains(&"XYZ".to_string()));
    }

    #[test]
    fn three_views_promote_to_tier1() {
        let pm = PriorityManager::new();
        pm.promote("NEWSYM", Tier::Three);
        pm.record_view("NEWSYM");
        pm.record_view("NEWSYM");
        assert!(pm.get_tier1().is_empty() || !pm.get_tier1().contains(&"NEWSYM".to_string()));
        pm.record_view("NEWSYM");
        assert!(pm.get_tier1().contains(&"NEWSYM".to_string()));
    }

    #[test]
    fn load_universe_only_fills_tier3() {
        let pm = PriorityManager::new();
        pm.load_universe(&["AAPL".to_string(), "UNKNOWNCO".to_string()]);
        assert!(!pm.get_tier3().contains(&"AAPL".to_string()));
        assert!(pm.get_tier3().contains(&"UNKNOWNCO".to_string()));
    }

    #[test]
    fn membership_is_exclusive() {
        let pm = PriorityManager::new();
        pm.promote("DUP", Tier::One);
        pm.promote("DUP", Tier::Three);
        assert!(!pm.get_tier1().contains(&"DUP".to_string()));
        assert!(pm.get_tier3().contains(&"DUP".to_string()));
    }
}
