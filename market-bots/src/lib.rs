//! market-bots
//!
//! The seven `ResearchBot` adapters and the external provider clients
//! they sit on top of: GNews, FMP, Alpha Vantage, Polygon, FRED, Yahoo
//! Finance, and SEC EDGAR full-text search.
//!
//! - `http_client`: shared reqwest timeout/retry/back-off wrapper (§5).
//! - `providers`: one thin client module per external data source.
//! - `bots`: the seven `market_core::ResearchBot` implementations.
#![warn(missing_docs)]

/// Shared reqwest client with retry/back-off/429 handling (§5, §7).
pub mod http_client;
/// Thin clients for each external provider (§6.3).
pub mod providers;

/// The seven research-bot adapters.
pub mod bots;

pub use bots::analyst::AnalystBot;
pub use bots::earnings::EarningsBot;
pub use bots::fundamentals::FundamentalsBot;
pub use bots::insider::InsiderBot;
pub use bots::macro_bot::MacroBot;
pub use bots::news::NewsBot;
pub use bots::technical_levels::TechnicalLevelsBot;
pub use http_client::BotHttpClient;
