//! Bounded set of recently seen content hashes.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct DedupInner {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

/// Recent-content set shared across requests.
///
/// When the set grows past its capacity the oldest half is evicted. The
/// check-and-insert is a single critical section, so an abandoned caller
/// never leaves it half-updated.
#[derive(Debug)]
pub struct DedupCache {
    capacity: usize,
    inner: Mutex<DedupInner>,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(2),
            inner: Mutex::new(DedupInner::default()),
        }
    }

    /// Returns true if `hash` was already present; otherwise records it.
    pub fn check_and_insert(&self, hash: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.seen.contains(hash) {
            return true;
        }

        inner.seen.insert(hash.to_string());
        inner.order.push_back(hash.to_string());

        if inner.order.len() > self.capacity {
            let evict = self.capacity / 2;
            for _ in 0..evict {
                if let Some(old) = inner.order.pop_front() {
                    inner.seen.remove(&old);
                }
            }
            debug!(evicted = evict, remaining = inner.order.len(), "Dedup set evicted oldest half");
        }

        false
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.seen.clear();
        inner.order.clear();
    }
}
