//! Time-bounded in-process page cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::domain::ports::PageCache;

#[derive(Debug)]
struct Entry {
    stored_at: Instant,
    body: String,
}

/// Page cache holding rendered bodies for a fixed time-to-live.
///
/// Stale entries are dropped lazily on read.
#[derive(Debug)]
pub struct InMemoryPageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryPageCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PageCache for InMemoryPageCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .is_some_and(|entry| entry.stored_at.elapsed() < self.ttl);
        if fresh {
            entries.get(key).map(|entry| entry.body.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    fn put(&self, key: &str, body: String) {
        self.lock().insert(
            key.to_owned(),
            Entry {
                stored_at: Instant::now(),
                body,
            },
        );
    }

    fn flush(&self) {
        self.lock().clear();
    }
}
