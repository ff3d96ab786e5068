//! Port for the page-level response cache sitting in front of result reads.
//!
//! The cache is opaque to the tallying engine apart from one signal: every
//! successful vote or reset flushes it so later reads reflect new tallies.

/// Cached rendered responses keyed by request path.
#[cfg_attr(test, mockall::automock)]
pub trait PageCache: Send + Sync {
    /// Return a cached body for `key` if one is still fresh.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a rendered body for `key`.
    fn put(&self, key: &str, body: String);

    /// Drop every cached page.
    fn flush(&self);
}

/// Cache that never stores anything.
///
/// Use it where page caching is disabled or not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPageCache;

impl PageCache for NoPageCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn put(&self, _key: &str, _body: String) {}

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_page_cache_always_misses() {
        let cache = NoPageCache;
        cache.put("/results", "{}".to_owned());
        assert!(cache.get("/results").is_none());
        cache.flush();
    }
}
