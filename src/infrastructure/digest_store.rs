// Per-screen digest store backing the display poll protocol.
//
// The store remembers the last fingerprint served for each screen so the
// poll endpoint can answer "has anything changed" with one comparison.
// Backed by an LRU map: an evicted screen simply reports a change on its
// next poll and is re-seeded.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

pub struct DigestStore {
    inner: Mutex<LruCache<i64, String>>,
}

impl DigestStore {
    pub fn new(capacity: usize) -> Self {
        DigestStore {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).unwrap(),
            )),
        }
    }

    /// Last digest recorded for a screen, if still cached.
    pub async fn get(&self, screen_id: i64) -> Option<String> {
        self.inner.lock().await.get(&screen_id).cloned()
    }

    /// Record the digest for a screen, replacing any previous value.
    pub async fn put(&self, screen_id: i64, digest: String) {
        self.inner.lock().await.put(screen_id, digest);
    }

    /// Compare `current` against the stored digest for the screen.
    ///
    /// On mismatch (including a missing entry) the stored digest is
    /// replaced with `current` and `true` is returned, so a caller polls
    /// "changed" exactly once per content change.
    pub async fn has_changed(&self, screen_id: i64, current: &str) -> bool {
        let mut cache = self.inner.lock().await;
        let changed = cache.get(&screen_id).map(String::as_str) != Some(current);
        if changed {
            cache.put(screen_id, current.to_string());
        }
        changed
    }

    /// Drop a screen's entry, e.g. after the screen is deleted.
    pub async fn forget(&self, screen_id: i64) {
        self.inner.lock().await.pop(&screen_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_change_once_per_new_digest() {
        let store = DigestStore::new(16);

        // First poll has nothing stored yet.
        assert!(store.has_changed(1, "aaa").await);
        // Same digest again: no change.
        assert!(!store.has_changed(1, "aaa").await);
        // New digest flips once, then settles.
        assert!(store.has_changed(1, "bbb").await);
        assert!(!store.has_changed(1, "bbb").await);
    }

    #[tokio::test]
    async fn screens_are_tracked_independently() {
        let store = DigestStore::new(16);
        store.put(1, "aaa".into()).await;
        store.put(2, "bbb".into()).await;

        assert!(!store.has_changed(1, "aaa").await);
        assert!(!store.has_changed(2, "bbb").await);
        assert!(store.has_changed(2, "ccc").await);
        assert_eq!(store.get(1).await.as_deref(), Some("aaa"));
    }

    #[tokio::test]
    async fn forget_clears_the_entry() {
        let store = DigestStore::new(16);
        store.put(7, "aaa".into()).await;
        store.forget(7).await;
        assert_eq!(store.get(7).await, None);
    }
}
