//! HTTP peer transport.
//!
//! `HttpPool` is the node-side routing table: it owns the consistent-hash
//! ring and one client per peer, both replaced together under a single
//! mutex whenever the peer set is configured. `HttpPeer` is the client for
//! one remote node; it fetches values with bounded retries.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use reqwest::Url;

use super::protocol::DEFAULT_BASE_PATH;
use super::{PeerClient, PeerPicker};
use crate::ring::HashRing;

/// Virtual nodes placed on the ring per peer.
pub const DEFAULT_REPLICAS: usize = 50;

/// Per-request deadline for peer fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(2);
const FETCH_ATTEMPTS: usize = 3;

/// Routing table and client pool for one node.
pub struct HttpPool {
    self_url: String,
    base_path: String,
    client: reqwest::Client,
    /// Ring and client table change together; one lock covers both.
    state: Mutex<PoolState>,
}

struct PoolState {
    ring: HashRing,
    peers: HashMap<String, Arc<HttpPeer>>,
}

impl HttpPool {
    /// Creates a pool for the node reachable at `self_url`
    /// (e.g. `http://127.0.0.1:8001`), serving peers under [`DEFAULT_BASE_PATH`].
    pub fn new(self_url: impl Into<String>) -> Arc<Self> {
        Self::with_base_path(self_url, DEFAULT_BASE_PATH)
    }

    /// Creates a pool serving peers under a custom path prefix.
    pub fn with_base_path(self_url: impl Into<String>, base_path: &str) -> Arc<Self> {
        let self_url = self_url.into().trim_end_matches('/').to_string();
        let base_path = format!("/{}", base_path.trim_matches('/'));

        Arc::new(Self {
            self_url,
            base_path,
            client: reqwest::Client::new(),
            state: Mutex::new(PoolState {
                ring: HashRing::new(DEFAULT_REPLICAS),
                peers: HashMap::new(),
            }),
        })
    }

    /// Configures the full peer set, including this node's own URL.
    ///
    /// The ring and the client table are rebuilt from scratch; the previous
    /// topology is discarded.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ring = HashRing::new(DEFAULT_REPLICAS);
        let mut clients = HashMap::new();

        for peer in peers {
            let peer = peer.into().trim_end_matches('/').to_string();
            ring.add([peer.clone()]);
            clients.insert(
                peer.clone(),
                Arc::new(HttpPeer {
                    base_url: format!("{}{}", peer, self.base_path),
                    client: self.client.clone(),
                }),
            );
        }
        tracing::info!(
            "node {} now tracks {} peers on the ring",
            self.self_url,
            clients.len()
        );

        let mut state = self.state.lock();
        state.ring = ring;
        state.peers = clients;
    }

    pub fn self_url(&self) -> &str {
        &self.self_url
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The configured peer URLs, sorted for stable output.
    pub fn peer_urls(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut urls: Vec<String> = state.peers.keys().cloned().collect();
        urls.sort();
        urls
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>> {
        let state = self.state.lock();
        let owner = state.ring.get(key)?;
        if owner == self.self_url {
            return None;
        }
        tracing::debug!("routing key {} to peer {}", key, owner);
        state
            .peers
            .get(owner)
            .map(|peer| Arc::clone(peer) as Arc<dyn PeerClient>)
    }
}

/// HTTP client bound to one peer's lookup endpoint.
pub struct HttpPeer {
    /// Peer URL including the base path, e.g. `http://host:port/_cache`.
    base_url: String,
    client: reqwest::Client,
}

impl HttpPeer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn lookup_url(&self, group: &str, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("peer url cannot be a base: {}", self.base_url))?
            .push(group)
            .push(key);
        Ok(url)
    }

    /// Sends the request, retrying transport failures with backoff and
    /// jitter. HTTP error statuses are returned to the caller unretried.
    async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..FETCH_ATTEMPTS {
            let response = self
                .client
                .get(url.clone())
                .timeout(FETCH_TIMEOUT)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == FETCH_ATTEMPTS {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("retry attempts exhausted"))
    }
}

impl PeerClient for HttpPeer {
    fn fetch<'a>(
        &'a self,
        group: &'a str,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.lookup_url(group, key)?;
            let response = self.get_with_retry(url).await?;

            if !response.status().is_success() {
                anyhow::bail!(
                    "peer {} answered {} for {}/{}",
                    self.base_url,
                    response.status(),
                    group,
                    key
                );
            }
            Ok(response.bytes().await?.to_vec())
        })
    }
}
