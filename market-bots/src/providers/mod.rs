//! Thin per-provider HTTP clients (§6.3).
//!
//! Each client owns only URL-building and key handling; response
//! parsing into bot-specific shapes lives in `crate::bots`. A client
//! whose API key is absent returns a [`market_core::ResearchError::Config`]
//! immediately rather than issuing a request, so the owning bot can
//! degrade to an empty result without burning a rate-limiter token.

pub mod alpha_vantage;
pub mod fmp;
pub mod fred;
pub mod gnews;
pub mod polygon;
pub mod sec_edgar;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use fmp::FmpClient;
pub use fred::FredClient;
pub use gnews::GNewsClient;
pub use polygon::PolygonClient;
pub use sec_edgar::SecEdgarClient;
pub use yahoo::YahooClient;
