//! Per-job asset filters (§4.9), grounded on the reference scheduler's
//! `_is_us`/`_is_uk_eu`/`_is_crypto`/`_is_commodity_forex`/`_is_asian_adr`
//! predicates and `_pick`/`_drop` combinators.

const EU_SUFFIXES: [&str; 6] = [".L", ".PA", ".DE", ".AS", ".MI", ".MC"];
const NON_US_SUFFIXES: [&str; 9] = [".L", ".PA", ".DE", ".AS", ".MI", ".MC", ".TO", ".AX", "=X"];

/// Curated Asian ADRs the overnight job sweeps alongside US Tier-1 (reference `_ASIAN_ADRS`).
const ASIAN_ADRS: [&str; 22] = [
    "BABA", "BIDU", "NIO", "JD", "PDD", "SE", "TSM", "TCEHY", "SONY", "HDB", "INFY", "WIT", "TTM",
    "RDY", "VALE", "PBR", "ITUB", "GRAB", "NVO", "ASML", "DESP", "XPEV",
];

/// Curated commodity/forex ETFs beyond the `=X` suffix rule (reference `_COMMODITY_FOREX`).
const COMMODITY_FOREX: [&str; 7] = ["GLD", "SLV", "USO", "DBC", "WEAT", "CORN", "PDBC"];

/// True for US-listed tickers: no non-US suffix and no crypto `-USD` marker.
#[must_use]
pub fn is_us(ticker: &str) -> bool {
    !NON_US_SUFFIXES.iter().any(|s| ticker.ends_with(s)) && !ticker.contains("-USD")
}

/// True for UK/EU-listed tickers.
#[must_use]
pub fn is_uk_eu(ticker: &str) -> bool {
    EU_SUFFIXES.iter().any(|s| ticker.ends_with(s))
}

/// True for crypto pairs.
#[must_use]
pub fn is_crypto(ticker: &str) -> bool {
    ticker.contains("-USD")
}

/// True for commodity/forex instruments.
#[must_use]
pub fn is_commodity_forex(ticker: &str) -> bool {
    ticker.contains("=X") || COMMODITY_FOREX.contains(&ticker)
}

/// True for the curated Asian-ADR list swept alongside US Tier-1 overnight.
#[must_use]
pub fn is_asian_adr(ticker: &str) -> bool {
    ASIAN_ADRS.contains(&ticker)
}

/// Symbols from `symbols` matching any predicate, order-preserved, deduped.
#[must_use]
pub fn pick(symbols: &[String], predicates: &[fn(&str) -> bool]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for symbol in symbols {
        if seen.contains(symbol) {
            continue;
        }
        if predicates.iter().any(|p| p(symbol)) {
            out.push(symbol.clone());
            seen.insert(symbol.clone());
        }
    }
    out
}

/// Symbols from `symbols` matching none of `predicates`.
#[must_use]
pub fn drop_matching(symbols: &[String], predicates: &[fn(&str) -> bool]) -> Vec<String> {
    symbols.iter().filter(|s| !predicates.iter().any(|p| p(s))).cloned().collect()
}

/// Union of symbol lists, order-preserved, deduped.
#[must_use]
pub fn union(lists: Vec<Vec<String>>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for symbol in list {
            if seen.insert(symbol.clone()) {
                out.push(symbol);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_excludes_eu_and_crypto() {
        assert!(is_us("AAPL"));
        assert!(!is_us("SAP.DE"));
        assert!(!is_us("BTC-USD"));
    }

    #[test]
    fn uk_eu_suffixes() {
        assert!(is_uk_eu("BP.L"));
        assert!(is_uk_eu("MC.PA"));
        assert!(!is_uk_eu("AAPL"));
    }

    #[test]
    fn pick_preserves_order_and_dedupes() {
        let symbols = vec!["AAPL".to_string(), "SAP.DE".to_string(), "AAPL".to_string()];
        let picked = pick(&symbols, &[is_us]);
        assert_eq!(picked, vec!["AAPL".to_string()]);
    }

    #[test]
    fn drop_matching_removes_eu() {
        let symbols = vec!["AAPL".to_string(), "BP.L".to_string()];
        let dropped = drop_matching(&symbols, &[is_uk_eu]);
        assert_eq!(dropped, vec!["AAPL".to_string()]);
    }
}
