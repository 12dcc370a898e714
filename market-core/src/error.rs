use thiserror::Error;

/// Unified error type for the market research engine workspace.
///
/// Bots never let this escape their own `fetch` implementation — a
/// failed fetch becomes an empty [`crate::types::BotResult`] with
/// `error` set, per the bot contract. This type is used internally by
/// bot implementations and at the cache/HTTP/scheduler layers, where a
/// hard failure is still something code needs to propagate and log.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// A provider call failed in a way that was not a timeout or quota block.
    #[error("{provider} failed: {msg}")]
    Provider {
        /// Provider label, e.g. "GNews", "FMP", "SEC EDGAR".
        provider: String,
        /// Human-readable failure message.
        msg: String,
    },

    /// The provider responded but the payload did not have the expected shape.
    #[error("{provider} returned an unexpected payload: {msg}")]
    Parse {
        /// Provider label.
        provider: String,
        /// Description of what was expected/found.
        msg: String,
    },

    /// Provider authentication or quota was rejected outright (401/403 or explicit block).
    #[error("{provider} auth/quota rejected: {msg}")]
    Quota {
        /// Provider label.
        provider: String,
        /// Human-readable detail.
        msg: String,
    },

    /// A provider call exceeded its per-request timeout after retries.
    #[error("{provider} timed out after {attempts} attempt(s)")]
    Timeout {
        /// Provider label.
        provider: String,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Cache backend error (read or write). Non-fatal by contract:
    /// reads degrade to "pending", writes are logged and the sweep continues.
    #[error("cache error: {0}")]
    Cache(String),

    /// A bot name was not found in the registry.
    #[error("unknown bot: {0}")]
    UnknownBot(String),

    /// Configuration was missing or invalid for a required knob.
    #[error("config error: {0}")]
    Config(String),

    /// All bots for an asset failed; the sweep still writes an empty envelope.
    #[error("all bots failed for {symbol}")]
    AllBotsFailed {
        /// Symbol that was being swept.
        symbol: String,
    },

    /// JSON (de)serialisation failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ResearchError {
    /// Helper: build a `Provider` error.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Parse` error.
    pub fn parse(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Quota` error.
    pub fn quota(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Quota {
            provider: provider.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Timeout` error.
    #[must_use]
    pub const fn timeout(provider: String, attempts: u32) -> Self {
        Self::Timeout { provider, attempts }
    }
}
