// src/mutation.rs

//! Write operations with declared cache invalidation.
//!
//! A [`Mutation`] names the keys its success makes stale. The
//! [`MutationCoordinator`] runs it, records its status, and invalidates those
//! keys before returning. A failed mutation invalidates nothing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};

use crate::cache::{KeyFilter, QueryCache};
use crate::error::{AppError, Result, TransportError};

type Executor<P, O> = Arc<dyn Fn(P) -> BoxFuture<'static, std::result::Result<O, TransportError>> + Send + Sync>;

/// A named write operation and the cache keys it makes stale.
pub struct Mutation<P, O> {
    action: String,
    invalidates: Vec<KeyFilter>,
    execute: Executor<P, O>,
}

impl<P, O> Mutation<P, O>
where
    P: Send + 'static,
    O: Send + 'static,
{
    pub fn new<F, Fut>(action: impl Into<String>, execute: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<O, TransportError>> + Send + 'static,
    {
        Self {
            action: action.into(),
            invalidates: Vec::new(),
            execute: Arc::new(move |payload| execute(payload).boxed()),
        }
    }

    /// Declare a key (or key prefix) to invalidate on success.
    pub fn invalidates(mut self, filter: impl Into<KeyFilter>) -> Self {
        self.invalidates.push(filter.into());
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl<P, O> Clone for Mutation<P, O> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            invalidates: self.invalidates.clone(),
            execute: Arc::clone(&self.execute),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Last known state of one mutation action.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub action: String,
    pub status: MutationStatus,
    pub invalidates: Vec<KeyFilter>,
    pub error: Option<TransportError>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MutationRecord {
    fn idle(action: &str, invalidates: &[KeyFilter]) -> Self {
        Self {
            action: action.to_string(),
            status: MutationStatus::Idle,
            invalidates: invalidates.to_vec(),
            error: None,
            finished_at: None,
        }
    }
}

type Records = Arc<Mutex<HashMap<String, MutationRecord>>>;

/// Runs mutations against a shared [`QueryCache`].
#[derive(Clone)]
pub struct MutationCoordinator {
    cache: QueryCache,
    records: Records,
}

impl MutationCoordinator {
    pub fn new(cache: QueryCache) -> Self {
        Self {
            cache,
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Execute `mutation` with `payload`.
    ///
    /// On success every declared filter is invalidated before this returns.
    /// On failure the transport error is returned unchanged and the cache is
    /// left alone. A second run of an action that is still pending is
    /// rejected with [`AppError::MutationInFlight`].
    pub async fn run<P, O>(&self, mutation: &Mutation<P, O>, payload: P) -> Result<O>
    where
        P: Send + 'static,
        O: Send + 'static,
    {
        let action = mutation.action();
        {
            let mut records = lock(&self.records);
            let record = records
                .entry(action.to_string())
                .or_insert_with(|| MutationRecord::idle(action, &mutation.invalidates));
            if record.status == MutationStatus::Pending {
                return Err(AppError::MutationInFlight {
                    action: action.to_string(),
                });
            }
            record.status = MutationStatus::Pending;
            record.invalidates = mutation.invalidates.clone();
            record.error = None;
        }
        log::info!("Running mutation '{}'", action);

        let mut guard = PendingGuard {
            records: &self.records,
            action,
            armed: true,
        };
        let outcome = (mutation.execute)(payload).await;
        guard.armed = false;

        let mut records = lock(&self.records);
        let record = records
            .entry(action.to_string())
            .or_insert_with(|| MutationRecord::idle(action, &mutation.invalidates));
        record.finished_at = Some(Utc::now());

        match outcome {
            Ok(output) => {
                record.status = MutationStatus::Success;
                drop(records);
                let invalidated: usize = mutation
                    .invalidates
                    .iter()
                    .map(|filter| self.cache.invalidate(filter))
                    .sum();
                log::info!(
                    "Mutation '{}' succeeded, invalidated {} entries",
                    action,
                    invalidated
                );
                Ok(output)
            }
            Err(error) => {
                log::error!("Mutation '{}' failed: {}", action, error);
                record.status = MutationStatus::Error;
                record.error = Some(error.clone());
                Err(AppError::Transport(error))
            }
        }
    }

    /// Current record for `action`; idle if it never ran.
    pub fn record(&self, action: &str) -> MutationRecord {
        lock(&self.records)
            .get(action)
            .cloned()
            .unwrap_or_else(|| MutationRecord::idle(action, &[]))
    }
}

fn lock(records: &Records) -> MutexGuard<'_, HashMap<String, MutationRecord>> {
    records.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the record to idle when a pending run is dropped mid-flight.
struct PendingGuard<'a> {
    records: &'a Records,
    action: &'a str,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Some(record) = lock(self.records).get_mut(self.action) {
                log::warn!("Mutation '{}' cancelled", self.action);
                record.status = MutationStatus::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;
    use crate::cache::{CachePolicy, QueryKey, QueryOptions, QueryStatus};

    fn coordinator() -> MutationCoordinator {
        MutationCoordinator::new(QueryCache::new(CachePolicy::default()))
    }

    fn scan_mutation(
        result: std::result::Result<Value, TransportError>,
        latency: Duration,
    ) -> Mutation<u32, Value> {
        Mutation::new("trigger-scan", move |_pages: u32| {
            let result = result.clone();
            async move {
                tokio::time::sleep(latency).await;
                result
            }
        })
        .invalidates("dashboard-stats")
        .invalidates("recent-activity")
        .invalidates("technology-stats")
        .invalidates(KeyFilter::prefix("offers"))
    }

    async fn warm(cache: &QueryCache, key: QueryKey) {
        cache
            .fetch(&key, || async { Ok(1u32) }, QueryOptions::default())
            .await;
        assert_eq!(cache.is_stale(&key), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_scan_invalidates_declared_keys() {
        let coordinator = coordinator();
        let cache = coordinator.cache().clone();
        let dependents = [
            QueryKey::from("dashboard-stats"),
            QueryKey::from("recent-activity"),
            QueryKey::from("technology-stats"),
            QueryKey::from(["offers", "0", "100"]),
        ];
        for key in dependents.clone() {
            warm(&cache, key).await;
        }
        warm(&cache, QueryKey::from("company-stats")).await;

        let mutation = scan_mutation(Ok(json!({ "message": "ok" })), Duration::ZERO);
        let output = coordinator.run(&mutation, 2).await.unwrap();
        assert_eq!(output["message"], "ok");

        for key in &dependents {
            assert_eq!(cache.is_stale(key), Some(true), "{key} should be stale");
        }
        assert_eq!(cache.is_stale(&QueryKey::from("company-stats")), Some(false));

        let record = coordinator.record("trigger-scan");
        assert_eq!(record.status, MutationStatus::Success);
        assert_eq!(record.invalidates.len(), 4);
        assert!(record.finished_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_read_after_scan_refetches() {
        let coordinator = coordinator();
        let cache = coordinator.cache().clone();
        let key = QueryKey::from("dashboard-stats");
        warm(&cache, key.clone()).await;

        let mutation = scan_mutation(Ok(json!({ "message": "ok" })), Duration::ZERO);
        coordinator.run(&mutation, 1).await.unwrap();

        let entry = cache.get(&key, || async { Ok(2u32) }, QueryOptions::default());
        assert_eq!(entry.status, QueryStatus::Loading);
        let entry = cache.resolve(&key).await.unwrap();
        assert_eq!(*entry.data::<u32>().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_mutation_invalidates_nothing() {
        let coordinator = coordinator();
        let cache = coordinator.cache().clone();
        warm(&cache, QueryKey::from("dashboard-stats")).await;

        let error = TransportError::http(500, "Internal Server Error");
        let mutation = scan_mutation(Err(error.clone()), Duration::ZERO);
        let result = coordinator.run(&mutation, 1).await;

        match result {
            Err(AppError::Transport(e)) => assert_eq!(e, error),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(cache.is_stale(&QueryKey::from("dashboard-stats")), Some(false));

        let record = coordinator.record("trigger-scan");
        assert_eq!(record.status, MutationStatus::Error);
        assert_eq!(record.error, Some(error));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_run_is_rejected() {
        let coordinator = coordinator();
        let mutation = scan_mutation(Ok(json!({})), Duration::from_millis(100));

        let (first, second) = tokio::join!(coordinator.run(&mutation, 1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            coordinator.run(&mutation, 1).await
        });

        assert!(first.is_ok());
        assert!(matches!(
            second,
            Err(AppError::MutationInFlight { ref action }) if action == "trigger-scan"
        ));
        assert_eq!(
            coordinator.record("trigger-scan").status,
            MutationStatus::Success
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_run_returns_to_idle() {
        let coordinator = coordinator();
        let mutation = scan_mutation(Ok(json!({})), Duration::from_secs(10));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), coordinator.run(&mutation, 1)).await;
        assert!(timed_out.is_err());
        assert_eq!(coordinator.record("trigger-scan").status, MutationStatus::Idle);

        let mutation = scan_mutation(Ok(json!({})), Duration::ZERO);
        assert!(coordinator.run(&mutation, 1).await.is_ok());
    }

    #[test]
    fn test_unknown_action_is_idle() {
        let coordinator = coordinator();
        let record = coordinator.record("create-alert");
        assert_eq!(record.status, MutationStatus::Idle);
        assert!(record.invalidates.is_empty());
    }
}
