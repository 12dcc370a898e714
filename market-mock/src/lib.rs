//! market-mock
//!
//! Deterministic stand-ins for the seven [`market_core::ResearchBot`]
//! implementations, for exercising the sweeper, scheduler, and HTTP
//! surface in tests without reaching any external provider.
//!
//! Two sentinel tickers get special treatment, mirroring how the
//! teacher workspace's mock connector simulates provider misbehaviour:
//! `"FAIL"` makes every mock bot return a failed [`market_core::BotResult`],
//! and `"TIMEOUT"` makes every mock bot sleep briefly before returning a
//! normal result, so callers can exercise soft-budget/timeout paths.
#![warn(missing_docs)]

mod bots;

pub use bots::{
    all_mock_bots, mock_analyst_bot, mock_earnings_bot, mock_fundamentals_bot, mock_insider_bot,
    mock_macro_bot, mock_news_bot, mock_technical_levels_bot, FAIL_SYMBOL, TIMEOUT_SYMBOL,
};
