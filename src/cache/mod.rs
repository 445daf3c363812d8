//! Keyed query cache with staleness and retry policy.
//!
//! Each distinct [`QueryKey`] addresses exactly one [`CacheEntry`]. Entries are
//! published as whole `Arc<CacheEntry>` snapshots, so readers never observe a
//! half-updated entry.
//!
//! ## Entry lifecycle
//!
//! ```text
//! idle ──get──▶ loading ──ok──▶ success ──stale/invalidate/refetch──▶ loading
//!                  │                                                    │
//!                  └──retries exhausted──▶ error ──next read────────────┘
//! ```
//!
//! `data` holds the last successful payload and survives a later `loading` or
//! `error` state, so consumers can keep showing last-known-good data.

mod store;

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::TransportError;
use crate::models::CacheConfig;

pub use store::QueryCache;

/// Type-erased query result.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Identifier of one cacheable read, made of ordered segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append a segment.
    pub fn with(mut self, segment: impl ToString) -> Self {
        self.0.push(segment.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` segments lead this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<&str> for QueryKey {
    fn from(segment: &str) -> Self {
        Self(vec![segment.to_string()])
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Selects the entries an invalidation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    Exact(QueryKey),
    Prefix(QueryKey),
}

impl KeyFilter {
    pub fn prefix(key: impl Into<QueryKey>) -> Self {
        Self::Prefix(key.into())
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::Prefix(prefix) => key.starts_with(prefix),
        }
    }
}

impl From<QueryKey> for KeyFilter {
    fn from(key: QueryKey) -> Self {
        Self::Exact(key)
    }
}

impl From<&str> for KeyFilter {
    fn from(segment: &str) -> Self {
        Self::Exact(QueryKey::from(segment))
    }
}

impl fmt::Display for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "{key}"),
            Self::Prefix(key) => write!(f, "{key}*"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one cached read.
#[derive(Clone)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub status: QueryStatus,
    data: Option<Payload>,
    /// Failure of the latest settled fetch, cleared by the next success
    pub error: Option<TransportError>,
    /// Completion time of the latest successful fetch
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale_after: Duration,
}

impl CacheEntry {
    pub(crate) fn idle(key: QueryKey, stale_after: Duration) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            stale_after,
        }
    }

    /// Last successful payload, if it is a `T`.
    pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone()?.downcast::<T>().ok()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub(crate) fn set_data(&mut self, payload: Payload) {
        self.data = Some(payload);
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("error", &self.error)
            .field("fetched_at", &self.fetched_at)
            .field("stale_after", &self.stale_after)
            .finish()
    }
}

/// Cache-wide staleness and retry policy.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            stale_time: Duration::from_secs(config.stale_time_secs),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Per-query overrides of the cache policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    pub stale_time: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(stale_time);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matches_whole_segments() {
        let filter = KeyFilter::prefix("offers");
        assert!(filter.matches(&QueryKey::from(["offers", "0", "100"])));
        assert!(filter.matches(&QueryKey::from("offers")));
        assert!(!filter.matches(&QueryKey::from("offers-count")));
        assert!(!filter.matches(&QueryKey::from(["stats", "offers"])));
    }

    #[test]
    fn test_exact_filter() {
        let filter = KeyFilter::from("dashboard-stats");
        assert!(filter.matches(&QueryKey::from("dashboard-stats")));
        assert!(!filter.matches(&QueryKey::from(["dashboard-stats", "extra"])));
    }

    #[test]
    fn test_entry_downcast() {
        let mut entry = CacheEntry::idle(QueryKey::from("k"), Duration::from_secs(1));
        assert!(entry.data::<String>().is_none());

        entry.set_data(Arc::new(vec![1u32, 2, 3]));
        entry.status = QueryStatus::Success;
        assert_eq!(*entry.data::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
        assert!(entry.data::<String>().is_none());
    }

    #[test]
    fn test_error_entry_keeps_data() {
        let mut entry = CacheEntry::idle(QueryKey::from("k"), Duration::from_secs(1));
        entry.set_data(Arc::new(7u8));
        entry.status = QueryStatus::Error;
        entry.error = Some(TransportError::http(500, "Internal Server Error"));

        assert!(entry.has_data());
        assert_eq!(*entry.data::<u8>().unwrap(), 7);
        assert_eq!(
            entry.error,
            Some(TransportError::http(500, "Internal Server Error"))
        );
    }

    #[test]
    fn test_policy_from_config() {
        let policy = CachePolicy::default();
        assert_eq!(policy.stale_time, Duration::from_secs(300));
        assert_eq!(policy.max_retries, 1);
    }
}
