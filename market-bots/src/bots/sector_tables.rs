//! Sector-keyed lookup tables shared by `MacroBot` and `FundamentalsBot` (§4.3a).
//!
//! Sector strings are matched case-insensitively against
//! `AssetMeta.sector`; an unrecognised or absent sector falls back to
//! the documented default for each table.

/// Map a lower-cased sector label to its proxy sector ETF, defaulting to `SPY`.
#[must_use]
pub fn sector_etf(sector: &str) -> &'static str {
    match sector {
        "technology" => "XLK",
        "financials" | "finance" => "XLF",
        "healthcare" => "XLV",
        "energy" => "XLE",
        "consumer discretionary" => "XLY",
        "consumer staples" => "XLP",
        "industrials" => "XLI",
        "utilities" => "XLU",
        "real estate" => "XLRE",
        "materials" => "XLB",
        "communication services" => "XLC",
        _ => "SPY",
    }
}

/// Sensitivity of one sector to each of the five macro signals, in the
/// fixed order `[rate_env, inflation, growth, unemployment, yields]`,
/// corresponding to `(FEDFUNDS, CPIAUCSL, GDP, UNRATE, DGS10)`.
///
/// Adapted from a `SECTOR_MACRO_SENSITIVITY`-style table keyed on a
/// different (overlapping but non-identical) sector label set; rows
/// here are chosen to preserve each sector's qualitative macro exposure
/// under the eleven-sector GICS-ish labels this workspace uses.
/// `consumer staples` and `communication services` have no direct
/// source counterpart and are derived as defensive/muted variants of
/// `consumer discretionary`/`technology` respectively — see DESIGN.md.
#[must_use]
pub fn sector_sensitivity(sector: &str) -> Option<[f64; 5]> {
    match sector {
        "technology" => Some([-0.6, -0.2, 0.7, -0.3, -0.5]),
        "financials" | "finance" => Some([0.7, 0.2, 0.5, -0.2, 0.6]),
        "healthcare" => Some([-0.1, -0.1, 0.3, -0.1, -0.1]),
        "energy" => Some([-0.2, 0.7, 0.4, -0.1, 0.1]),
        "consumer discretionary" => Some([-0.4, -0.6, 0.6, -0.5, -0.3]),
        "consumer staples" => Some([-0.2, -0.3, 0.2, -0.2, -0.15]),
        "industrials" => Some([-0.3, 0.1, 0.8, -0.4, -0.2]),
        "utilities" => Some([-0.5, 0.0, 0.2, -0.1, -0.6]),
        "real estate" => Some([-0.8, -0.2, 0.3, -0.3, -0.7]),
        "materials" => Some([-0.3, 0.6, 0.5, -0.2, 0.0]),
        "communication services" => Some([-0.4, -0.1, 0.5, -0.2, -0.3]),
        _ => None,
    }
}

/// Sector-average trailing P/E used to classify a ticker's own P/E as
/// cheap or expensive relative to peers. Values per SPEC_FULL §4.3a.
#[must_use]
pub fn sector_average_pe(sector: &str) -> f64 {
    match sector {
        "technology" => 28.0,
        "healthcare" => 22.0,
        "financials" | "finance" => 14.0,
        "energy" => 12.0,
        "utilities" => 18.0,
        "consumer discretionary" => 20.0,
        "consumer staples" => 21.0,
        "industrials" => 18.0,
        "materials" => 16.0,
        "real estate" => 19.0,
        "communication services" => 19.0,
        _ => 20.0,
    }
}
