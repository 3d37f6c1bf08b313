use crate::model::Record;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct Entry {
    records: Arc<Vec<Record>>,
    fetched_at: Instant,
}

/// Per-key slot. Holding its lock is what serializes fetches for one key.
#[derive(Default)]
struct Slot {
    entry: Mutex<Option<Entry>>,
}

/// Listing sets keyed by resource locator, each kept for a fixed time-to-live.
///
/// At most one fetch per key is in flight; concurrent callers for the same
/// key wait for it and share the result. A zero TTL stores nothing, and an
/// empty result is never stored.
pub struct ListingCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Arc<Vec<Record>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<Record>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(key.to_string()).or_default().clone()
        };

        let mut entry = slot.entry.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!("Cache hit for {}", key);
                return cached.records.clone();
            }
        }

        debug!("Cache miss for {}", key);
        let records = Arc::new(fetch().await);
        *entry = if self.ttl.is_zero() {
            None
        } else if records.is_empty() {
            debug!("Not caching empty listing set for {}", key);
            None
        } else {
            Some(Entry {
                records: records.clone(),
                fetched_at: Instant::now(),
            })
        };
        records
    }

    /// Drops every expired entry whose slot is not busy fetching.
    pub async fn purge_expired(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| match slot.entry.try_lock() {
            Ok(entry) => entry
                .as_ref()
                .is_some_and(|e| e.fetched_at.elapsed() < self.ttl),
            Err(_) => true,
        });
        before - slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn records(price: u32) -> Vec<Record> {
        vec![Record {
            raw_date: "01.06.2025".into(),
            direction: "продам".into(),
            price_usd_per_ton: price,
        }]
    }

    #[tokio::test]
    async fn fresh_entries_are_reused() {
        let cache = ListingCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let got = cache
                .get_or_fetch("soya", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    records(200)
                })
                .await;
            assert_eq!(got[0].price_usd_per_ton, 200);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let cache = ListingCache::new(Duration::from_millis(20));
        cache.get_or_fetch("soya", || async { records(200) }).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let got = cache.get_or_fetch("soya", || async { records(210) }).await;
        assert_eq!(got[0].price_usd_per_ton, 210);
    }

    #[tokio::test]
    async fn zero_ttl_never_stores() {
        let cache = ListingCache::new(Duration::ZERO);
        cache.get_or_fetch("soya", || async { records(200) }).await;
        let got = cache.get_or_fetch("soya", || async { records(210) }).await;
        assert_eq!(got[0].price_usd_per_ton, 210);
    }

    #[tokio::test]
    async fn empty_results_are_not_cached() {
        let cache = ListingCache::new(Duration::from_secs(60));
        let first = cache.get_or_fetch("soya", || async { Vec::new() }).await;
        assert!(first.is_empty());

        let got = cache.get_or_fetch("soya", || async { records(200) }).await;
        assert_eq!(got[0].price_usd_per_ton, 200);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let cache = ListingCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            records(200)
        };

        let (a, b) = tokio::join!(cache.get_or_fetch("soya", fetch), cache.get_or_fetch("soya", fetch));
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn purge_drops_expired_keys() {
        let cache = ListingCache::new(Duration::from_millis(20));
        cache.get_or_fetch("soya", || async { records(200) }).await;
        cache.get_or_fetch("yachmin", || async { records(150) }).await;
        assert_eq!(cache.purge_expired().await, 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.purge_expired().await, 0);
    }
}
