//! Deterministic asset-type derivation (§4.7). Never stored — recomputed at sweep time.

use crate::types::{AssetType, QuoteType};

/// Ticker suffixes/markers that mark a non-US-listed ticker.
///
/// Used by InsiderBot (short-circuit to neutral) and TechnicalLevelsBot
/// (provider routing), not by asset-type derivation itself.
pub const NON_US_SUFFIXES: [&str; 8] = [".L", ".PA", ".DE", ".AS", ".TO", ".AX", "=X", "-USD"];

/// Derive `asset_type` from `quote_type` and ticker shape, top-to-bottom (§4.7).
#[must_use]
pub fn derive_asset_type(ticker: &str, quote_type: QuoteType, sector: Option<&str>) -> AssetType {
    if quote_type == QuoteType::Cryptocurrency || ticker.contains("-USD") {
        return AssetType::Crypto;
    }
    if quote_type == QuoteType::Forex || ticker.contains("=X") {
        return AssetType::Forex;
    }
    if quote_type == QuoteType::Etf {
        return AssetType::Etf;
    }
    if quote_type == QuoteType::Future || ticker.contains("=F") {
        return AssetType::Commodity;
    }
    if let Some(sector) = sector {
        let sector = sector.to_lowercase();
        if sector.contains("crypto") {
            return AssetType::Crypto;
        }
        if sector.contains("forex") || sector.contains("currency") {
            return AssetType::Forex;
        }
    }
    AssetType::Stock
}

/// True when `ticker` carries one of the non-US-listing markers (§4.7).
#[must_use]
pub fn is_non_us(ticker: &str) -> bool {
    NON_US_SUFFIXES.iter().any(|suffix| ticker.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_by_quote_type() {
        assert_eq!(
            derive_asset_type("BTC-USD", QuoteType::Cryptocurrency, None),
            AssetType::Crypto
        );
    }

    #[test]
    fn crypto_by_suffix_even_if_quote_type_says_equity() {
        assert_eq!(derive_asset_type("ETH-USD", QuoteType::Equity, None), AssetType::Crypto);
    }

    #[test]
    fn forex_by_suffix() {
        assert_eq!(derive_asset_type("EURUSD=X", QuoteType::Equity, None), AssetType::Forex);
    }

    #[test]
    fn etf_by_quote_type() {
        assert_eq!(derive_asset_type("SPY", QuoteType::Etf, None), AssetType::Etf);
    }

    #[test]
    fn commodity_by_future_suffix() {
        assert_eq!(derive_asset_type("CL=F", QuoteType::Equity, None), AssetType::Commodity);
    }

    #[test]
    fn commodity_by_quote_type() {
        assert_eq!(derive_asset_type("GOLD", QuoteType::Future, None), AssetType::Commodity);
    }

    #[test]
    fn default_stock() {
        assert_eq!(derive_asset_type("AAPL", QuoteType::Equity, Some("Technology")), AssetType::Stock);
    }

    #[test]
    fn non_us_suffixes_detected() {
        assert!(is_non_us("BP.L"));
        assert!(is_non_us("SAP.DE"));
        assert!(!is_non_us("AAPL"));
    }
}
