//! Byte-accounted LRU store.
//!
//! ## Mechanism
//! - **Recency list**: Entries live in an arena-backed doubly linked list.
//!   The tail is the most recently used entry; the head is the next
//!   eviction victim. Promotion is a relink, O(1).
//! - **Index**: A map from key to arena slot makes every operation O(1).
//! - **Budget**: `max_bytes` caps the sum of `key.len() + value.len()` over
//!   residents. A budget of zero disables eviction entirely.

use std::collections::HashMap;

use super::ByteView;

/// Sentinel for absent list links.
const NIL: usize = usize::MAX;

/// Callback invoked after an entry has been removed by eviction.
pub type EvictionHandler = Box<dyn FnMut(&str, &ByteView) + Send>;

struct Node {
    key: String,
    value: ByteView,
    prev: usize,
    next: usize,
}

/// LRU cache with a byte budget.
///
/// Not safe for concurrent access; [`super::SharedCache`] wraps it in a
/// mutex. Freed arena slots are recycled through a free list, so long-lived
/// caches do not grow the arena past their peak entry count.
pub struct LruCache {
    max_bytes: usize,
    used_bytes: usize,
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    /// Least recently used entry, evicted first.
    head: usize,
    /// Most recently used entry.
    tail: usize,
    on_evict: Option<EvictionHandler>,
}

impl LruCache {
    /// Creates a cache capped at `max_bytes`. Zero means unbounded.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
            on_evict: None,
        }
    }

    /// Creates a cache that reports each eviction to `on_evict`.
    ///
    /// The handler runs while the enclosing lock (if any) is held; it must
    /// not call back into the same cache.
    pub fn with_eviction_handler(max_bytes: usize, on_evict: EvictionHandler) -> Self {
        Self {
            on_evict: Some(on_evict),
            ..Self::new(max_bytes)
        }
    }

    /// Looks up a key, promoting it to most recently used on a hit.
    ///
    /// The returned view shares storage with the resident entry; that is
    /// sound because views are immutable.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.attach_tail(idx);
        Some(self.nodes[idx].value.clone())
    }

    /// Inserts or replaces an entry, then evicts from the head until the
    /// budget holds again.
    ///
    /// Replacing an existing key counts as a use and promotes it. An entry
    /// larger than the whole budget stays resident alone until the next
    /// insert displaces it.
    pub fn insert(&mut self, key: &str, value: ByteView) {
        if let Some(&idx) = self.index.get(key) {
            self.used_bytes = self.used_bytes - self.nodes[idx].value.len() + value.len();
            self.nodes[idx].value = value;
            self.detach(idx);
            self.attach_tail(idx);
        } else {
            self.used_bytes += key.len() + value.len();
            let idx = self.alloc(key.to_string(), value);
            self.index.insert(key.to_string(), idx);
            self.attach_tail(idx);
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes && self.index.len() > 1 {
            self.evict_oldest();
        }
    }

    /// Removes the least recently used entry and reports it to the eviction
    /// handler. No-op on an empty cache.
    pub fn evict_oldest(&mut self) {
        if self.head == NIL {
            return;
        }
        let idx = self.head;
        self.detach(idx);

        let key = std::mem::take(&mut self.nodes[idx].key);
        let value = std::mem::take(&mut self.nodes[idx].value);
        self.index.remove(&key);
        self.used_bytes -= key.len() + value.len();
        self.free.push(idx);

        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&key, &value);
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged against the budget.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn alloc(&mut self, key: String, value: ByteView) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx].key = key;
                self.nodes[idx].value = value;
                idx
            }
            None => {
                self.nodes.push(Node {
                    key,
                    value,
                    prev: NIL,
                    next: NIL,
                });
                self.nodes.len() - 1
            }
        }
    }

    fn detach(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn attach_tail(&mut self, idx: usize) {
        self.nodes[idx].prev = self.tail;
        self.nodes[idx].next = NIL;
        if self.tail != NIL {
            self.nodes[self.tail].next = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
    }
}
