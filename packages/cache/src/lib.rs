#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Memoization of finished assessments keyed by [`Query`].
//!
//! [`MemoryCache`] runs at most one computation per key at a time:
//! concurrent callers for the same query wait on a shared
//! [`tokio::sync::OnceCell`] and receive the first caller's result.
//! Failed computations are never stored, so the next waiter (or the next
//! request) computes again.

pub mod clock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use flood_risk_assessment_models::{AssessmentError, Query, RiskAssessment};
use futures::future::BoxFuture;
use tokio::sync::OnceCell;

pub use clock::{Clock, SystemClock};

#[cfg(test)]
use clock::ManualClock;

/// The deferred computation handed to [`ResultCache::get_or_compute`].
pub type ComputeFuture<'a> = BoxFuture<'a, Result<RiskAssessment, AssessmentError>>;

/// Bounds on what a [`MemoryCache`] retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum number of stored assessments. The least recently used
    /// entry is evicted when exceeded.
    pub max_entries: Option<usize>,
    /// How long a stored assessment stays valid.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// Default capacity.
    pub const DEFAULT_MAX_ENTRIES: usize = 1024;

    /// No capacity limit and no expiry.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_entries: None,
            ttl: None,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_entries: Some(Self::DEFAULT_MAX_ENTRIES),
            ttl: None,
        }
    }
}

/// A memoizing store of assessments.
#[async_trait::async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns the stored assessment for `query`, or awaits `compute`,
    /// stores its success and returns it.
    ///
    /// `compute` is dropped unpolled on a hit.
    ///
    /// # Errors
    ///
    /// Returns the computation's error. Errors are not stored.
    async fn get_or_compute<'a>(
        &'a self,
        query: &'a Query,
        compute: ComputeFuture<'a>,
    ) -> Result<RiskAssessment, AssessmentError>;
}

struct Slot {
    cell: Arc<OnceCell<RiskAssessment>>,
    published_at: Option<Instant>,
    last_access: Instant,
}

/// In-process [`ResultCache`] with optional capacity and expiry bounds.
pub struct MemoryCache {
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<Query, Slot>>,
}

impl MemoryCache {
    /// Creates a cache driven by the system clock.
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Creates a cache driven by `clock`.
    #[must_use]
    pub fn with_clock(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The policy this cache enforces.
    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Number of stored (completed) assessments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.published_at.is_some())
            .count()
    }

    /// Returns `true` if no assessment is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Query, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, slot: &Slot, now: Instant) -> bool {
        match (self.policy.ttl, slot.published_at) {
            (Some(ttl), Some(published_at)) => now.saturating_duration_since(published_at) >= ttl,
            _ => false,
        }
    }

    /// Returns the cell for `query`, replacing an expired one.
    fn checkout(&self, query: &Query) -> Arc<OnceCell<RiskAssessment>> {
        let now = self.clock.now();
        let mut slots = self.lock();

        if slots.get(query).is_some_and(|slot| self.is_expired(slot, now)) {
            log::debug!("Cache entry for {} expired", query.location());
            slots.remove(query);
        }

        let slot = slots.entry(query.clone()).or_insert_with(|| Slot {
            cell: Arc::new(OnceCell::new()),
            published_at: None,
            last_access: now,
        });
        slot.last_access = now;

        Arc::clone(&slot.cell)
    }

    fn publish(&self, query: &Query, cell: &Arc<OnceCell<RiskAssessment>>) {
        let now = self.clock.now();
        let mut slots = self.lock();

        if let Some(slot) = slots.get_mut(query)
            && Arc::ptr_eq(&slot.cell, cell)
            && slot.published_at.is_none()
        {
            slot.published_at = Some(now);
            slot.last_access = now;
        }

        self.evict(&mut slots, now);
    }

    /// Drops the slot of a failed or abandoned computation unless another
    /// caller is still waiting on it.
    fn discard_unfinished(&self, query: &Query, cell: &Arc<OnceCell<RiskAssessment>>) {
        let mut slots = self.lock();

        // One reference held by the map, one by us.
        if let Some(slot) = slots.get(query)
            && Arc::ptr_eq(&slot.cell, cell)
            && !cell.initialized()
            && Arc::strong_count(cell) == 2
        {
            slots.remove(query);
        }
    }

    fn evict(&self, slots: &mut HashMap<Query, Slot>, now: Instant) {
        if self.policy.ttl.is_some() {
            slots.retain(|_, slot| !self.is_expired(slot, now));
        }

        let Some(max_entries) = self.policy.max_entries else {
            return;
        };

        let mut published: Vec<(Instant, Query)> = slots
            .iter()
            .filter(|(_, slot)| slot.published_at.is_some())
            .map(|(query, slot)| (slot.last_access, query.clone()))
            .collect();

        let excess = published.len().saturating_sub(max_entries);
        if excess == 0 {
            return;
        }

        published.sort_by_key(|(last_access, _)| *last_access);
        for (_, query) in published.into_iter().take(excess) {
            log::debug!("Evicting cache entry for {}", query.location());
            slots.remove(&query);
        }
    }
}

/// A checked-out slot. Dropping it before the cell is filled (an error,
/// or the caller's future being dropped mid-compute) removes the slot.
struct Checkout<'a> {
    cache: &'a MemoryCache,
    query: &'a Query,
    cell: Arc<OnceCell<RiskAssessment>>,
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        if !self.cell.initialized() {
            self.cache.discard_unfinished(self.query, &self.cell);
        }
    }
}

#[async_trait::async_trait]
impl ResultCache for MemoryCache {
    async fn get_or_compute<'a>(
        &'a self,
        query: &'a Query,
        compute: ComputeFuture<'a>,
    ) -> Result<RiskAssessment, AssessmentError> {
        let slot = Checkout {
            cache: self,
            query,
            cell: self.checkout(query),
        };

        if let Some(hit) = slot.cell.get() {
            log::debug!("Cache hit for {}", query.location());
            return Ok(hit.clone());
        }

        let value = slot.cell.get_or_try_init(|| compute).await?.clone();
        self.publish(query, &slot.cell);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use flood_risk_assessment_models::{Coordinates, Location, SourceReport};
    use futures::FutureExt as _;

    use super::*;

    fn query(depth: f64) -> Query {
        Query::new(
            Location::Coordinates(Coordinates::new(29.76, -95.37).unwrap()),
            depth,
        )
        .unwrap()
    }

    fn assessment(text: &str) -> RiskAssessment {
        RiskAssessment {
            explanation_text: text.to_string(),
            likelihood_rating: None,
            likelihood_explanation: None,
            degraded: false,
            hazard_profile: None,
            alerts: Vec::new(),
            sources: SourceReport::default(),
        }
    }

    fn counting<'a>(calls: &'a AtomicUsize, text: &'a str) -> ComputeFuture<'a> {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(assessment(text))
        }
        .boxed()
    }

    fn failing(calls: &AtomicUsize) -> ComputeFuture<'_> {
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Err(AssessmentError::Generation {
                cause: "backend down".to_string(),
            })
        }
        .boxed()
    }

    #[tokio::test]
    async fn computes_once_per_query() {
        let cache = MemoryCache::new(CachePolicy::unbounded());
        let calls = AtomicUsize::new(0);
        let q = query(3.0);

        let first = cache.get_or_compute(&q, counting(&calls, "a")).await.unwrap();
        let second = cache.get_or_compute(&q, counting(&calls, "b")).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(second.explanation_text, "a");
    }

    #[tokio::test]
    async fn distinct_queries_compute_independently() {
        let cache = MemoryCache::new(CachePolicy::default());
        let calls = AtomicUsize::new(0);

        cache.get_or_compute(&query(1.0), counting(&calls, "one")).await.unwrap();
        let two = cache.get_or_compute(&query(2.0), counting(&calls, "two")).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(two.explanation_text, "two");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_computation() {
        let cache = MemoryCache::new(CachePolicy::default());
        let calls = AtomicUsize::new(0);
        let q = query(3.0);

        let (a, b) = futures::join!(
            cache.get_or_compute(&q, counting(&calls, "shared")),
            cache.get_or_compute(&q, counting(&calls, "other")),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().explanation_text, "shared");
        assert_eq!(b.unwrap().explanation_text, "shared");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = MemoryCache::new(CachePolicy::default());
        let calls = AtomicUsize::new(0);
        let q = query(3.0);

        assert!(cache.get_or_compute(&q, failing(&calls)).await.is_err());
        assert!(cache.is_empty());

        cache.get_or_compute(&q, counting(&calls, "ok")).await.unwrap();
        cache.get_or_compute(&q, counting(&calls, "again")).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn waiter_on_failed_computation_computes_next() {
        let cache = MemoryCache::new(CachePolicy::default());
        let calls = AtomicUsize::new(0);
        let q = query(3.0);

        let (a, b) = futures::join!(
            cache.get_or_compute(&q, failing(&calls)),
            cache.get_or_compute(&q, counting(&calls, "recovered")),
        );

        assert!(a.is_err());
        assert_eq!(b.unwrap().explanation_text, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_recomputed() {
        let clock = Arc::new(ManualClock::new());
        let policy = CachePolicy {
            max_entries: None,
            ttl: Some(Duration::from_secs(60)),
        };
        let cache = MemoryCache::with_clock(policy, clock.clone());
        let calls = AtomicUsize::new(0);
        let q = query(3.0);

        cache.get_or_compute(&q, counting(&calls, "v1")).await.unwrap();
        clock.advance(Duration::from_secs(59));
        let hit = cache.get_or_compute(&q, counting(&calls, "v2")).await.unwrap();
        assert_eq!(hit.explanation_text, "v1");

        clock.advance(Duration::from_secs(2));
        let fresh = cache.get_or_compute(&q, counting(&calls, "v2")).await.unwrap();
        assert_eq!(fresh.explanation_text, "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn evicts_least_recently_used_over_capacity() {
        let clock = Arc::new(ManualClock::new());
        let policy = CachePolicy {
            max_entries: Some(2),
            ttl: None,
        };
        let cache = MemoryCache::with_clock(policy, clock.clone());
        let calls = AtomicUsize::new(0);
        let step = Duration::from_secs(1);

        cache.get_or_compute(&query(1.0), counting(&calls, "a")).await.unwrap();
        clock.advance(step);
        cache.get_or_compute(&query(2.0), counting(&calls, "b")).await.unwrap();
        clock.advance(step);
        cache.get_or_compute(&query(1.0), counting(&calls, "a")).await.unwrap();
        clock.advance(step);
        cache.get_or_compute(&query(3.0), counting(&calls, "c")).await.unwrap();
        clock.advance(step);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 2);

        cache.get_or_compute(&query(1.0), counting(&calls, "a")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.get_or_compute(&query(2.0), counting(&calls, "b")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn abandoned_computations_release_their_slots() {
        let policy = CachePolicy {
            max_entries: Some(2),
            ttl: None,
        };
        let cache = MemoryCache::new(policy);

        for i in 0..50u32 {
            let q = query(f64::from(i) + 1.0);
            let stalled = cache.get_or_compute(&q, futures::future::pending().boxed());
            assert!(stalled.now_or_never().is_none());
        }

        assert_eq!(cache.lock().len(), 0);

        let calls = AtomicUsize::new(0);
        let q = query(1.0);
        let value = cache.get_or_compute(&q, counting(&calls, "retry")).await.unwrap();
        assert_eq!(value.explanation_text, "retry");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abandoned_computation_leaves_slot_to_waiter() {
        let cache = MemoryCache::new(CachePolicy::default());
        let calls = AtomicUsize::new(0);
        let q = query(3.0);

        let mut stalled = cache.get_or_compute(&q, futures::future::pending().boxed());
        assert!((&mut stalled).now_or_never().is_none());

        let mut waiter = cache.get_or_compute(&q, counting(&calls, "waiter"));
        assert!((&mut waiter).now_or_never().is_none());
        drop(stalled);

        assert_eq!(waiter.await.unwrap().explanation_text, "waiter");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn default_policy_is_bounded_without_expiry() {
        let policy = CachePolicy::default();
        assert_eq!(policy.max_entries, Some(1024));
        assert_eq!(policy.ttl, None);
        assert_eq!(CachePolicy::unbounded().max_entries, None);
    }
}
