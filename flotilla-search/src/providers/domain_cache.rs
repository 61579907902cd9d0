//! Expiring cache of a provider's current mirror domain.

use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Last-writer-wins cache of one domain with an expiry.
///
/// Owned by a single provider. Concurrent invocations may race to refresh it;
/// whichever write lands last wins, and a stale value only costs a failed
/// fetch.
#[derive(Debug)]
pub struct DomainCache {
    ttl: Duration,
    entry: RwLock<Option<(String, Instant)>>,
}

impl DomainCache {
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Returns the cached domain if it has not expired.
    pub fn get(&self) -> Option<String> {
        let entry = self.entry.read();
        entry
            .as_ref()
            .filter(|(_, stored_at)| stored_at.elapsed() < self.ttl)
            .map(|(domain, _)| domain.clone())
    }

    /// Stores a freshly resolved domain.
    pub fn set(&self, domain: impl Into<String>) {
        *self.entry.write() = Some((domain.into(), Instant::now()));
    }

    /// Drops the cached domain so the next lookup refreshes it.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_get_after_set() {
        let cache = DomainCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(), None);

        cache.set("https://mirror-a.example.com");
        assert_eq!(cache.get().as_deref(), Some("https://mirror-a.example.com"));

        cache.set("https://mirror-b.example.com");
        assert_eq!(cache.get().as_deref(), Some("https://mirror-b.example.com"));
    }

    #[test]
    fn test_zero_ttl_always_expired() {
        let cache = DomainCache::new(Duration::ZERO);
        cache.set("https://mirror.example.com");
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_invalidate() {
        let cache = DomainCache::new(Duration::from_secs(60));
        cache.set("https://mirror.example.com");
        cache.invalidate();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_concurrent_writers_leave_a_whole_value() {
        let cache = Arc::new(DomainCache::new(Duration::from_secs(60)));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set(format!("https://mirror-{i}.example.com"));
                        let _ = cache.get();
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        let domain = cache.get().unwrap();
        assert!(domain.starts_with("https://mirror-") && domain.ends_with(".example.com"));
    }
}
