//! Router configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the route table is searched for the best match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Binary-search the priority-sorted index for the first candidate that
    /// can match, then scan forward until the first actual match.
    #[default]
    Indexed,
    /// Scan every route in registration order and keep the highest-priority
    /// match seen.
    Linear,
}

/// Tunables for a [`Router`](crate::Router).
///
/// # Example
///
/// ```
/// use oxide_mux::{MatchStrategy, RouterConfig};
///
/// let config = RouterConfig::from_json(r#"{"strategy": "linear"}"#).unwrap();
/// assert_eq!(config.strategy, MatchStrategy::Linear);
/// assert_eq!(config.redirect_status, 301);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route selection algorithm.
    pub strategy: MatchStrategy,
    /// Compare the first indexed candidate by plain string equality before
    /// running the pattern matcher. Only used by [`MatchStrategy::Indexed`].
    pub exact_fast_path: bool,
    /// Status code of the redirect sent for non-canonical paths.
    pub redirect_status: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::Indexed,
            exact_fast_path: true,
            redirect_status: 301,
        }
    }
}

impl RouterConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::Config`](crate::MuxError::Config) if `json` is
    /// malformed or names an unknown strategy.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the match strategy.
    #[must_use]
    pub const fn strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enables or disables the exact-string fast path.
    #[must_use]
    pub const fn exact_fast_path(mut self, enabled: bool) -> Self {
        self.exact_fast_path = enabled;
        self
    }
}
