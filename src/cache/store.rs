// src/cache/store.rs

//! Shared query store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::time::Instant;

use super::{CacheEntry, CachePolicy, KeyFilter, Payload, QueryKey, QueryOptions, QueryStatus};
use crate::error::TransportError;

type FetchResult = Result<Payload, TransportError>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;

/// The most recently started fetch for a key.
struct InFlight {
    issue: u64,
    done: Shared<BoxFuture<'static, ()>>,
    /// Issued before an invalidation; the next read starts a newer fetch
    superseded: bool,
}

struct Slot {
    tx: watch::Sender<Arc<CacheEntry>>,
    /// Number of the most recently issued fetch
    issued: u64,
    /// Number of the fetch whose result is currently published
    applied: u64,
    /// Fetches numbered up to here were issued before the last invalidation
    invalidated_through: u64,
    fresh_until: Option<Instant>,
    in_flight: Option<InFlight>,
}

impl Slot {
    fn new(key: QueryKey, stale_after: Duration) -> Self {
        let (tx, _) = watch::channel(Arc::new(CacheEntry::idle(key, stale_after)));
        Self {
            tx,
            issued: 0,
            applied: 0,
            invalidated_through: 0,
            fresh_until: None,
            in_flight: None,
        }
    }

    fn snapshot(&self) -> Arc<CacheEntry> {
        self.tx.borrow().clone()
    }

    /// Replace the published entry with an edited copy.
    fn publish(&self, edit: impl FnOnce(&mut CacheEntry)) {
        let mut next = CacheEntry::clone(&self.tx.borrow());
        edit(&mut next);
        self.tx.send_replace(Arc::new(next));
    }

    fn is_stale(&self, now: Instant) -> bool {
        self.fresh_until.is_none_or(|until| now >= until)
    }

    fn needs_fetch(&self, now: Instant) -> bool {
        self.in_flight.as_ref().is_none_or(|f| f.superseded) && self.is_stale(now)
    }
}

struct Inner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    policy: CachePolicy,
}

/// Process-wide store of asynchronous read results.
///
/// Cloning is cheap and every clone addresses the same entries. Fetches run
/// on spawned tokio tasks, so methods that may start one must be called from
/// within a runtime.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                policy,
            }),
        }
    }

    /// Snapshot of `key`, starting a background fetch when the entry is
    /// missing, stale or invalidated and nothing is in flight for it.
    ///
    /// A stale entry keeps its previous data while it reloads.
    pub fn get<T, F, Fut>(&self, key: &QueryKey, fetcher: F, options: QueryOptions) -> Arc<CacheEntry>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let stale_time = options.stale_time.unwrap_or(self.inner.policy.stale_time);
        let mut slots = self.lock();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone(), stale_time));

        if slot.needs_fetch(Instant::now()) {
            self.start_fetch(key, slot, erase(fetcher), options);
        } else {
            log::debug!("Cache hit for {}", key);
        }
        slot.snapshot()
    }

    /// Like [`get`](Self::get), then wait until the key settles.
    ///
    /// Concurrent callers for the same key share one underlying request.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetcher: F,
        options: QueryOptions,
    ) -> Arc<CacheEntry>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let snapshot = self.get(key, fetcher, options);
        self.resolve(key).await.unwrap_or(snapshot)
    }

    /// Start a new fetch for `key` even if one is in flight or the entry is
    /// fresh. The older fetch is superseded: its result is dropped if it
    /// lands after this one.
    pub fn refetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetcher: F,
        options: QueryOptions,
    ) -> Arc<CacheEntry>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
    {
        let stale_time = options.stale_time.unwrap_or(self.inner.policy.stale_time);
        let mut slots = self.lock();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone(), stale_time));
        self.start_fetch(key, slot, erase(fetcher), options);
        slot.snapshot()
    }

    /// Wait for the fetch in flight for `key`, if any, and return the settled
    /// snapshot. Returns `None` for unknown keys.
    pub async fn resolve(&self, key: &QueryKey) -> Option<Arc<CacheEntry>> {
        loop {
            let pending = {
                let slots = self.lock();
                let slot = slots.get(key)?;
                match &slot.in_flight {
                    Some(in_flight) => in_flight.done.clone(),
                    None => return Some(slot.snapshot()),
                }
            };
            pending.await;
        }
    }

    /// Current snapshot without side effects.
    pub fn peek(&self, key: &QueryKey) -> Option<Arc<CacheEntry>> {
        self.lock().get(key).map(Slot::snapshot)
    }

    /// Observe every update of `key`. Dropping the receiver detaches the
    /// observer without touching the cache.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<Arc<CacheEntry>> {
        let stale_time = self.inner.policy.stale_time;
        self.lock()
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone(), stale_time))
            .tx
            .subscribe()
    }

    /// Whether the next read of `key` would refetch. `None` for unknown keys.
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        let now = Instant::now();
        self.lock().get(key).map(|slot| slot.is_stale(now))
    }

    /// Mark every matching entry stale. A fetch in flight for a matching key
    /// is superseded: the next read issues a new one, while `resolve` keeps
    /// waiting on whichever fetch is latest.
    ///
    /// Returns the number of entries invalidated.
    pub fn invalidate(&self, filter: &KeyFilter) -> usize {
        let mut slots = self.lock();
        let mut count = 0;
        for (_, slot) in slots.iter_mut().filter(|(key, _)| filter.matches(key)) {
            slot.fresh_until = None;
            slot.invalidated_through = slot.issued;
            if let Some(in_flight) = slot.in_flight.as_mut() {
                in_flight.superseded = true;
            }
            count += 1;
        }
        log::debug!("Invalidated {} entries matching {}", count, filter);
        count
    }

    /// Drop every entry. Fetches still running are discarded on completion.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn start_fetch(&self, key: &QueryKey, slot: &mut Slot, fetcher: Fetcher, options: QueryOptions) {
        let policy = self.inner.policy;
        let stale_time = options.stale_time.unwrap_or(policy.stale_time);
        let max_retries = options.max_retries.unwrap_or(policy.max_retries);

        slot.issued += 1;
        let issue = slot.issued;
        slot.publish(|entry| {
            entry.status = QueryStatus::Loading;
            entry.stale_after = stale_time;
        });
        log::debug!("Fetching {} (#{})", key, issue);

        let cache: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = key.clone();
        let task = tokio::spawn(async move {
            let result = fetch_with_retries(&key, &fetcher, max_retries, policy.retry_delay).await;
            if let Some(inner) = cache.upgrade() {
                QueryCache { inner }.complete(&key, issue, stale_time, result);
            }
        });

        let done = async move {
            if let Err(e) = task.await {
                log::error!("Fetch task failed: {}", e);
            }
        }
        .boxed()
        .shared();
        slot.in_flight = Some(InFlight {
            issue,
            done,
            superseded: false,
        });
    }

    /// Apply the result of fetch number `issue` unless a later-issued fetch
    /// has already been applied.
    fn complete(&self, key: &QueryKey, issue: u64, stale_time: Duration, result: FetchResult) {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(key) else {
            return;
        };

        if slot.in_flight.as_ref().is_some_and(|f| f.issue == issue) {
            slot.in_flight = None;
        }
        if issue <= slot.applied {
            log::debug!("Dropping superseded result #{} for {}", issue, key);
            return;
        }
        slot.applied = issue;

        let newer_pending = slot.in_flight.is_some();
        match result {
            Ok(payload) => {
                if issue > slot.invalidated_through {
                    slot.fresh_until = Some(Instant::now() + stale_time);
                }
                slot.publish(|entry| {
                    entry.status = if newer_pending {
                        QueryStatus::Loading
                    } else {
                        QueryStatus::Success
                    };
                    entry.set_data(payload);
                    entry.error = None;
                    entry.fetched_at = Some(Utc::now());
                    entry.stale_after = stale_time;
                });
            }
            Err(error) => {
                slot.fresh_until = None;
                slot.publish(|entry| {
                    entry.status = if newer_pending {
                        QueryStatus::Loading
                    } else {
                        QueryStatus::Error
                    };
                    entry.error = Some(error);
                });
            }
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

fn erase<T, F, Fut>(fetcher: F) -> Fetcher
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TransportError>> + Send + 'static,
{
    Arc::new(move || {
        let fut = fetcher();
        async move { fut.await.map(|value| Arc::new(value) as Payload) }.boxed()
    })
}

async fn fetch_with_retries(
    key: &QueryKey,
    fetcher: &Fetcher,
    max_retries: u32,
    retry_delay: Duration,
) -> FetchResult {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(payload) => return Ok(payload),
            Err(error) if attempt < max_retries => {
                attempt += 1;
                log::warn!(
                    "Fetch for {} failed: {}. Retry {}/{}",
                    key,
                    error,
                    attempt,
                    max_retries
                );
                tokio::time::sleep(retry_delay).await;
            }
            Err(error) => {
                log::error!("Fetch for {} failed: {}", key, error);
                return Err(error);
            }
        }
    }
}
