use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::debug;

use crate::inventory::model::IdempotencyRecord;

struct CacheInner {
    map: HashMap<String, IdempotencyRecord>,
    order: VecDeque<String>,
}

/// Bounded in-process replay cache in front of the idempotency table.
///
/// Guarantees:
/// - Memory usage is bounded by `max_entries` (insertion-order eviction).
/// - Expired records read as absent and are dropped on access.
/// - Write-through only: a miss here means "ask the store", never "absent".
///   The cache is not coherent across replicas.
pub struct ReplayCache {
    max_entries: usize,
    inner: Mutex<CacheInner>,
}

impl ReplayCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str, now_epoch: i64) -> Option<IdempotencyRecord> {
        let mut inner = self.inner.lock();
        match inner.map.get(key) {
            None => return None,
            Some(rec) if rec.expires_at_epoch > now_epoch => return Some(rec.clone()),
            Some(_) => {}
        }
        // Expired: indistinguishable from absent, and not worth keeping.
        inner.map.remove(key);
        inner.order.retain(|k| k != key);
        None
    }

    pub fn insert(&self, key: String, record: IdempotencyRecord) {
        let mut inner = self.inner.lock();

        if !inner.map.contains_key(&key) {
            while inner.map.len() >= self.max_entries {
                let Some(evicted) = inner.order.pop_front() else {
                    break;
                };
                inner.map.remove(&evicted);
                debug!(target: "cache", evicted = %evicted, "replay cache at capacity; evicted oldest entry");
            }
            inner.order.push_back(key.clone());
        }
        inner.map.insert(key, record);
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.map.remove(key);
        inner.order.retain(|k| k != key);
    }
}
