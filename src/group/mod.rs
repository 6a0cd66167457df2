//! Cache Group Module
//!
//! A `Group` is a named cache namespace: it owns a local byte-budgeted
//! store, the origin loader that produces values on a miss, a request
//! coalescer, and (optionally) a peer picker for routing misses to the
//! node that owns the key.
//!
//! ## Lookup Flow
//! 1. The local cache is consulted; a hit returns immediately.
//! 2. The miss enters the coalescer, so concurrent misses on one key fund
//!    a single load.
//! 3. The load asks the picker for the key's owner. A remote owner is
//!    fetched over the transport; on failure (or when this node owns the
//!    key) the origin loader runs instead.
//! 4. Origin-loaded values are installed in the local cache. Peer-fetched
//!    values are returned without caching, keeping one authoritative
//!    resident copy per key in the cluster.
//!
//! Groups live in a process-wide directory and persist for the process
//! lifetime.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock, OnceLock};

use anyhow::Result;
use dashmap::DashMap;

use crate::cache::{ByteView, SharedCache};
use crate::error::CacheError;
use crate::singleflight::SingleFlight;
use crate::transport::{PeerClient, PeerPicker};

/// Origin loader: asked for the bytes of a key the cache cannot answer.
/// Stored boxed so call sites can hand in plain async closures.
pub type LoaderFn =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>> + Send + Sync>;

/// Process-wide directory of groups, keyed by name.
static GROUPS: LazyLock<DashMap<String, Arc<Group>>> = LazyLock::new(DashMap::new);

/// A named cache namespace.
pub struct Group {
    name: String,
    loader: LoaderFn,
    main_cache: SharedCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight<Result<ByteView, CacheError>>,
}

/// Creates a group and registers it in the process-wide directory.
///
/// `max_bytes` caps the local cache (zero for unbounded). Registering a
/// name twice replaces the previous group; the last writer wins.
pub fn new_group<F, Fut>(name: &str, max_bytes: usize, loader: F) -> Arc<Group>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    let loader: LoaderFn = Arc::new(move |key: String| {
        Box::pin(loader(key)) as Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>>
    });

    let group = Arc::new(Group {
        name: name.to_string(),
        loader,
        main_cache: SharedCache::new(max_bytes),
        peers: OnceLock::new(),
        flight: SingleFlight::new(),
    });

    GROUPS.insert(name.to_string(), group.clone());
    tracing::info!("registered cache group {}", name);
    group
}

/// Looks up a previously registered group.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GROUPS.get(name).map(|entry| entry.value().clone())
}

/// Snapshot of all registered groups, for diagnostics.
pub fn list_groups() -> Vec<Arc<Group>> {
    GROUPS.iter().map(|entry| entry.value().clone()).collect()
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wires a peer picker into the group.
    ///
    /// # Panics
    /// Panics when called a second time; swapping pickers at runtime is a
    /// programming error.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("register_peers called more than once");
        }
    }

    /// Looks up `key`, consulting the local cache first and loading through
    /// the coalescer on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        if key.is_empty() {
            return Err(CacheError::KeyRequired);
        }

        if let Some(view) = self.main_cache.get(key) {
            tracing::debug!("cache hit for {} in group {}", key, self.name);
            return Ok(view);
        }

        self.load(key).await
    }

    /// Loads a missing key: at most one load per key is in flight, peers
    /// are preferred over the origin, and peer failures fall back to the
    /// origin within the same coalesced call.
    async fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        self.flight
            .run(key, || async move {
                if let Some(peers) = self.peers.get() {
                    if let Some(peer) = peers.pick_peer(key) {
                        match self.fetch_from_peer(peer.as_ref(), key).await {
                            Ok(view) => return Ok(view),
                            Err(e) => {
                                tracing::warn!(
                                    "peer fetch for {} failed, falling back to origin: {}",
                                    key,
                                    e
                                );
                            }
                        }
                    }
                }
                self.load_from_origin(key).await
            })
            .await
    }

    async fn fetch_from_peer(&self, peer: &dyn PeerClient, key: &str) -> Result<ByteView> {
        let bytes = peer.fetch(&self.name, key).await?;
        // Remote hits are not installed locally; the owning peer already
        // caches this key.
        Ok(ByteView::from(bytes))
    }

    async fn load_from_origin(&self, key: &str) -> Result<ByteView, CacheError> {
        match (self.loader)(key.to_string()).await {
            Ok(bytes) => {
                let view = ByteView::from(bytes);
                self.main_cache.insert(key, view.clone());
                Ok(view)
            }
            Err(e) => Err(CacheError::origin(e)),
        }
    }

    /// Number of entries resident in the local cache.
    pub fn cached_entries(&self) -> usize {
        self.main_cache.len()
    }

    /// Bytes charged against the local cache budget.
    pub fn cached_bytes(&self) -> usize {
        self.main_cache.used_bytes()
    }
}

#[cfg(test)]
mod tests;
