//! Configuration Module
//!
//! Handles the options shared by every stash and loading them from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{Bounds, EvictionPolicy};

const DEFAULT_EVICTION_POLICY: EvictionPolicy = EvictionPolicy::LeastFrequentlyUsed;
const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(30);
const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_DEBUG_ENABLED: bool = true;

/// Stash configuration parameters.
///
/// Absent (or zero) bounds disable the matching eviction check.
#[derive(Debug, Clone, PartialEq)]
pub struct StashConfig {
    /// Order in which entries are considered for eviction
    pub eviction_policy: Option<EvictionPolicy>,
    /// Maximum age since the last write
    pub time_to_live: Option<Duration>,
    /// Maximum aggregate payload size in bytes
    pub max_size: Option<u64>,
    /// Period of the background eviction task for backends that use one
    pub eviction_interval: Option<Duration>,
    /// Enables diagnostics through the stash logger
    pub debug: bool,
    /// Prepended to every diagnostic line
    pub debug_prefix: String,
}

impl StashConfig {
    /// A configuration with no policy and no bounds: nothing is ever evicted.
    pub fn unbounded() -> Self {
        Self {
            eviction_policy: None,
            time_to_live: None,
            max_size: None,
            eviction_interval: None,
            debug: false,
            debug_prefix: String::new(),
        }
    }

    /// Creates a new StashConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STASH_EVICTION_POLICY` - Policy name (default: least_frequently_used)
    /// - `STASH_TIME_TO_LIVE` - TTL in seconds, 0 disables (default: 30)
    /// - `STASH_MAX_SIZE` - Max aggregate size in bytes, 0 disables (default: none)
    /// - `STASH_EVICTION_RATE` - Background eviction interval in seconds (default: 60)
    /// - `STASH_DEBUG_ENABLED` - Diagnostics on/off (default: true)
    /// - `STASH_DEBUG_PREFIX` - Diagnostic line prefix (default: empty)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`StashConfig::from_env`] over an arbitrary variable source.
    ///
    /// Empty values are ignored; unparsable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(policy) = var("STASH_EVICTION_POLICY").and_then(|v| v.parse().ok()) {
            config.eviction_policy = Some(policy);
        }
        if let Some(secs) = var("STASH_TIME_TO_LIVE").and_then(|v| parse::<u64>(&v)) {
            config.time_to_live = Some(Duration::from_secs(secs));
        }
        if let Some(max) = var("STASH_MAX_SIZE").and_then(|v| parse::<u64>(&v)) {
            config.max_size = Some(max);
        }
        if let Some(secs) = var("STASH_EVICTION_RATE").and_then(|v| parse::<u64>(&v)) {
            config.eviction_interval = Some(Duration::from_secs(secs));
        }
        if let Some(debug) = var("STASH_DEBUG_ENABLED").and_then(|v| parse_bool(&v)) {
            config.debug = debug;
        }
        if let Some(prefix) = var("STASH_DEBUG_PREFIX") {
            config.debug_prefix = prefix;
        }

        config
    }

    /// The eviction bounds described by this configuration.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            policy: self.eviction_policy,
            max_size: self.max_size,
            time_to_live: self.time_to_live,
        }
    }

    /// Background eviction interval, `None` when disabled.
    pub fn active_eviction_interval(&self) -> Option<Duration> {
        self.eviction_interval.filter(|interval| !interval.is_zero())
    }
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            eviction_policy: Some(DEFAULT_EVICTION_POLICY),
            time_to_live: Some(DEFAULT_TIME_TO_LIVE),
            max_size: None,
            eviction_interval: Some(DEFAULT_EVICTION_INTERVAL),
            debug: DEFAULT_DEBUG_ENABLED,
            debug_prefix: String::new(),
        }
    }
}

// == Parsing Helpers ==
pub(crate) fn parse<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
