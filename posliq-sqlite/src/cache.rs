//! Per-user crossing snapshots with a bounded lifetime.
//!
//! The crossing recomputes every pending line for a period, which is too
//! expensive to redo on every pagination click. Snapshots are keyed by
//! (user, period) and expire after a TTL, but a write never waits for the
//! clock: the liquidation generator and the import deletion path invalidate
//! the period explicitly on commit.

use posliq_core::models::{Iccid, Period, StorePreview};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// The full, unfiltered merge for one (user, period); filtering, sorting
/// and pagination are applied per request on top of this.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub stores: Vec<StorePreview>,
    pub orphans: Vec<Iccid>,
}

struct Entry {
    at: Instant,
    snapshot: Arc<Snapshot>,
}

pub(crate) struct PreviewCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, Period), Entry>>,
}

impl PreviewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, user: &str, period: Period) -> Option<Arc<Snapshot>> {
        let entries = self.entries.lock().expect("preview cache poisoned");
        let entry = entries.get(&(user.to_owned(), period))?;
        if entry.at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.snapshot))
    }

    pub fn put(&self, user: &str, period: Period, snapshot: Arc<Snapshot>) {
        let mut entries = self.entries.lock().expect("preview cache poisoned");
        entries.insert(
            (user.to_owned(), period),
            Entry {
                at: Instant::now(),
                snapshot,
            },
        );
    }

    /// Drop every user's snapshot of a period. Called after any write that
    /// changes what a liquidation run would produce.
    pub fn invalidate_period(&self, period: Period) {
        let mut entries = self.entries.lock().expect("preview cache poisoned");
        entries.retain(|(_, p), _| *p != period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Arc<Snapshot> {
        Arc::new(Snapshot {
            stores: Vec::new(),
            orphans: Vec::new(),
        })
    }

    #[test]
    fn expires_after_ttl() {
        let cache = PreviewCache::new(Duration::ZERO);
        let period = Period::new(2024, 1).unwrap();
        cache.put("ops", period, empty());
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get("ops", period).is_none());
    }

    #[test]
    fn invalidation_is_per_period_across_users() {
        let cache = PreviewCache::new(Duration::from_secs(60));
        let jan = Period::new(2024, 1).unwrap();
        let feb = Period::new(2024, 2).unwrap();
        cache.put("a", jan, empty());
        cache.put("b", jan, empty());
        cache.put("a", feb, empty());

        cache.invalidate_period(jan);
        assert!(cache.get("a", jan).is_none());
        assert!(cache.get("b", jan).is_none());
        assert!(cache.get("a", feb).is_some());
    }
}
