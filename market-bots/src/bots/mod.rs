//! The seven research-bot adapters (§4.3).

/// Price-target/consensus-rating adapter.
pub mod analyst;
/// Next-earnings-date/EPS-surprise adapter.
pub mod earnings;
/// Sector fundamentals adapter.
pub mod fundamentals;
/// SEC EDGAR Form-4 insider-activity adapter.
pub mod insider;
/// FRED + sector-ETF macro adapter.
pub mod macro_bot;
/// GNews headline-sentiment adapter.
pub mod news;
/// Price/technical-indicator adapter.
pub mod technical_levels;

pub(crate) mod sector_tables;
