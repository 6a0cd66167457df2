use parking_lot::Mutex;

use super::{ByteView, LruCache};

/// Mutex-guarded cache with lazy construction.
///
/// The underlying [`LruCache`] is built on the first insert, so a group that
/// never populates its cache pays nothing for it. Lookups before that first
/// insert miss without allocating.
pub struct SharedCache {
    max_bytes: usize,
    inner: Mutex<Option<LruCache>>,
}

impl SharedCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(None),
        }
    }

    pub fn insert(&self, key: &str, value: ByteView) {
        let mut inner = self.inner.lock();
        inner
            .get_or_insert_with(|| LruCache::new(self.max_bytes))
            .insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut inner = self.inner.lock();
        inner.as_mut()?.get(key)
    }

    /// Number of resident entries, zero before the first insert.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes charged against the budget, zero before the first insert.
    pub fn used_bytes(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, LruCache::used_bytes)
    }
}
