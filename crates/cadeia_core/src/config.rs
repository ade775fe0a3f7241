//! Engine configuration.
//!
//! # Invariants
//! - Defaults follow the strict behavior: office-scoped resolution on, no
//!   auto-provisioning.
//! - Unknown keys are rejected so typos never silently fall back to defaults.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_TRUNK_CACHE_TTL_SECS: u64 = 300;

/// Behavior switches for resolution, provisioning and caching.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Scope references without an entry office by the citing document's
    /// own office instead of searching every office.
    pub strict_office_scoping: bool,
    /// Create placeholder documents for references that do not resolve.
    pub auto_provision: bool,
    /// TTL handed to the trunk cache port.
    pub trunk_cache_ttl_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            strict_office_scoping: true,
            auto_provision: false,
            trunk_cache_ttl_secs: DEFAULT_TRUNK_CACHE_TTL_SECS,
        }
    }
}

impl ChainConfig {
    /// Parses configuration from a JSON object; missing keys take defaults.
    pub fn from_json_str(value: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(value).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn with_auto_provision(mut self, enabled: bool) -> Self {
        self.auto_provision = enabled;
        self
    }

    pub fn with_strict_office_scoping(mut self, enabled: bool) -> Self {
        self.strict_office_scoping = enabled;
        self
    }

    pub fn trunk_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.trunk_cache_ttl_secs)
    }
}

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid chain config: {message}"),
        }
    }
}

impl Error for ConfigError {}
