//! Eviction Policy Module
//!
//! Decides which entries of a snapshot should be removed. The policy only
//! chooses the order entries are considered in; the configured bounds decide
//! whether anything is removed at all.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, Key};

// == Eviction Policy ==
/// Order in which entries are considered for eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Oldest `first_created` first
    FirstInFirstOut,
    /// Oldest `last_read` first
    LeastRecentlyUsed,
    /// Lowest `read_count` first
    LeastFrequentlyUsed,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::FirstInFirstOut => "first_in_first_out",
            EvictionPolicy::LeastRecentlyUsed => "least_recently_used",
            EvictionPolicy::LeastFrequentlyUsed => "least_frequently_used",
        }
    }

    /// Sorts `entries` so the first element is the first eviction candidate.
    ///
    /// The sort is stable: ties keep the snapshot's order.
    pub fn sort(&self, entries: &mut [CacheEntry]) {
        match self {
            EvictionPolicy::FirstInFirstOut => entries.sort_by_key(|e| e.first_created),
            EvictionPolicy::LeastRecentlyUsed => entries.sort_by_key(|e| e.last_read),
            EvictionPolicy::LeastFrequentlyUsed => entries.sort_by_key(|e| e.read_count),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_in_first_out" | "fifo" => Ok(EvictionPolicy::FirstInFirstOut),
            "least_recently_used" | "lru" => Ok(EvictionPolicy::LeastRecentlyUsed),
            "least_frequently_used" | "lfu" => Ok(EvictionPolicy::LeastFrequentlyUsed),
            other => Err(format!("unknown eviction policy: {}", other)),
        }
    }
}

// == Bounds ==
/// Limits that make entries eligible for eviction.
///
/// `None` or zero disables a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub policy: Option<EvictionPolicy>,
    /// Maximum aggregate payload size in bytes
    pub max_size: Option<u64>,
    /// Maximum time since the last write
    pub time_to_live: Option<Duration>,
}

impl Bounds {
    fn active_max_size(&self) -> Option<u64> {
        self.max_size.filter(|max| *max > 0)
    }

    fn active_ttl_ns(&self) -> Option<i128> {
        self.time_to_live
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| i128::try_from(ttl.as_nanos()).unwrap_or(i128::MAX))
    }

    /// True when at least one bound is configured.
    pub fn is_bounded(&self) -> bool {
        self.active_max_size().is_some() || self.active_ttl_ns().is_some()
    }
}

// == Eviction ==
/// Why an entry was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    MaxSizeExceeded,
    TimeToLiveExceeded,
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionReason::MaxSizeExceeded => f.write_str("max size exceeded"),
            EvictionReason::TimeToLiveExceeded => f.write_str("ttl exceeded"),
        }
    }
}

/// An entry chosen for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    pub key: Key,
    pub size: u64,
    pub reason: EvictionReason,
}

// == Select Evictions ==
/// Returns the entries of `entries` to remove, in policy order.
///
/// The aggregate size starts as the snapshot total and drops with each
/// selection. A snapshot of zero or one entries never yields an eviction.
/// `now` is a Unix timestamp in nanoseconds.
pub fn select_evictions(mut entries: Vec<CacheEntry>, bounds: &Bounds, now: i64) -> Vec<Eviction> {
    if entries.len() <= 1 || !bounds.is_bounded() {
        return Vec::new();
    }

    if let Some(policy) = bounds.policy {
        policy.sort(&mut entries);
    }

    let max_size = bounds.active_max_size();
    let ttl_ns = bounds.active_ttl_ns();
    let mut total: u64 = entries.iter().map(|e| e.size).sum();
    let mut evictions = Vec::new();

    for entry in entries {
        let reason = match (max_size, ttl_ns) {
            (Some(max), _) if total > max => EvictionReason::MaxSizeExceeded,
            (_, Some(ttl)) if entry.age_since_update(now) > ttl => {
                EvictionReason::TimeToLiveExceeded
            }
            // Only the size bound is active and it is satisfied; it cannot
            // be exceeded again further down.
            (_, None) => break,
            _ => continue,
        };

        total = total.saturating_sub(entry.size);
        evictions.push(Eviction {
            key: entry.key,
            size: entry.size,
            reason,
        });
    }

    evictions
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1_000_000;

    fn entry(key: &str, size: usize, created: i64, read: i64, reads: u64) -> CacheEntry {
        let mut entry = CacheEntry::new(Key::from(key), vec![0u8; size]);
        entry.first_created = created;
        entry.last_updated = created;
        entry.last_read = read;
        entry.read_count = reads;
        entry
    }

    fn keys(evictions: &[Eviction]) -> Vec<String> {
        evictions.iter().map(|e| e.key.to_string()).collect()
    }

    #[test]
    fn test_policy_names() {
        for policy in [
            EvictionPolicy::FirstInFirstOut,
            EvictionPolicy::LeastRecentlyUsed,
            EvictionPolicy::LeastFrequentlyUsed,
        ] {
            assert_eq!(policy.as_str().parse::<EvictionPolicy>().unwrap(), policy);
            let json = serde_json::to_string(&policy).unwrap();
            assert_eq!(json, format!("\"{}\"", policy));
        }
        assert_eq!("LRU".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::LeastRecentlyUsed);
        assert!("random".parse::<EvictionPolicy>().is_err());
    }

    #[test]
    fn test_no_bounds_no_evictions() {
        let entries = vec![entry("a", 100, 0, 0, 0), entry("b", 100, MS, MS, 0)];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::FirstInFirstOut),
            ..Bounds::default()
        };
        assert!(select_evictions(entries, &bounds, i64::MAX).is_empty());
    }

    #[test]
    fn test_zero_bounds_are_disabled() {
        let entries = vec![entry("a", 100, 0, 0, 0), entry("b", 100, MS, MS, 0)];
        let bounds = Bounds {
            policy: None,
            max_size: Some(0),
            time_to_live: Some(Duration::ZERO),
        };
        assert!(select_evictions(entries, &bounds, i64::MAX).is_empty());
    }

    #[test]
    fn test_single_entry_is_never_evicted() {
        let entries = vec![entry("only", 1_000, 0, 0, 0)];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::LeastRecentlyUsed),
            max_size: Some(1),
            time_to_live: Some(Duration::from_nanos(1)),
        };
        assert!(select_evictions(entries, &bounds, i64::MAX).is_empty());
    }

    #[test]
    fn test_size_bound_without_policy_keeps_snapshot_order() {
        let entries = vec![entry("first", 49, 5 * MS, 0, 0), entry("second", 49, 0, 0, 0)];
        let bounds = Bounds {
            max_size: Some(97),
            ..Bounds::default()
        };
        let evictions = select_evictions(entries, &bounds, 10 * MS);
        assert_eq!(keys(&evictions), vec!["first"]);
        assert_eq!(evictions[0].reason, EvictionReason::MaxSizeExceeded);
        assert_eq!(evictions[0].size, 49);
    }

    #[test]
    fn test_fifo_orders_by_creation() {
        let entries = vec![
            entry("newest", 10, 3 * MS, 0, 0),
            entry("oldest", 10, MS, 9 * MS, 9),
            entry("middle", 10, 2 * MS, 0, 0),
        ];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::FirstInFirstOut),
            max_size: Some(15),
            ..Bounds::default()
        };
        let evictions = select_evictions(entries, &bounds, 10 * MS);
        assert_eq!(keys(&evictions), vec!["oldest", "middle"]);
    }

    #[test]
    fn test_lru_orders_by_last_read() {
        let entries = vec![
            entry("a", 10, 0, 5 * MS, 0),
            entry("b", 10, MS, 2 * MS, 0),
            entry("c", 10, 2 * MS, 7 * MS, 0),
        ];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::LeastRecentlyUsed),
            max_size: Some(20),
            ..Bounds::default()
        };
        let evictions = select_evictions(entries, &bounds, 10 * MS);
        assert_eq!(keys(&evictions), vec!["b"]);
    }

    #[test]
    fn test_lfu_orders_by_read_count() {
        let entries = vec![
            entry("hot", 10, 0, 0, 5),
            entry("cold", 10, MS, 0, 0),
            entry("warm", 10, 2 * MS, 0, 2),
        ];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::LeastFrequentlyUsed),
            max_size: Some(10),
            ..Bounds::default()
        };
        let evictions = select_evictions(entries, &bounds, 10 * MS);
        assert_eq!(keys(&evictions), vec!["cold", "warm"]);
    }

    #[test]
    fn test_ttl_scans_every_entry() {
        let entries = vec![
            entry("fresh", 10, 9 * MS, 0, 0),
            entry("stale", 10, 0, 0, 0),
            entry("also_stale", 10, MS, 0, 0),
        ];
        let bounds = Bounds {
            time_to_live: Some(Duration::from_millis(5)),
            ..Bounds::default()
        };
        let evictions = select_evictions(entries, &bounds, 10 * MS);
        assert_eq!(keys(&evictions), vec!["stale", "also_stale"]);
        assert!(evictions
            .iter()
            .all(|e| e.reason == EvictionReason::TimeToLiveExceeded));
    }

    #[test]
    fn test_ttl_may_empty_a_multi_entry_snapshot() {
        let entries = vec![entry("a", 10, 0, 0, 1), entry("b", 10, 0, 0, 0)];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::LeastFrequentlyUsed),
            time_to_live: Some(Duration::from_secs(1)),
            ..Bounds::default()
        };
        let evictions = select_evictions(entries, &bounds, 2_000 * MS);
        assert_eq!(keys(&evictions), vec!["b", "a"]);
    }

    #[test]
    fn test_size_then_ttl_reasons() {
        let entries = vec![
            entry("big", 100, 0, 0, 0),
            entry("fresh", 10, 9 * MS, 0, 0),
            entry("stale", 10, MS, 0, 0),
        ];
        let bounds = Bounds {
            policy: Some(EvictionPolicy::FirstInFirstOut),
            max_size: Some(50),
            time_to_live: Some(Duration::from_millis(5)),
        };
        let evictions = select_evictions(entries, &bounds, 10 * MS);
        assert_eq!(keys(&evictions), vec!["big", "stale"]);
        assert_eq!(evictions[0].reason, EvictionReason::MaxSizeExceeded);
        assert_eq!(evictions[1].reason, EvictionReason::TimeToLiveExceeded);
    }
}
