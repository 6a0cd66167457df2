//! Peer Transport Module
//!
//! Defines how a group reaches other nodes: picking the peer that owns a
//! key, and fetching a value from it. The traits here are the seam between
//! the orchestration logic and the wire; the provided implementation speaks
//! HTTP (`http`), with its endpoints and DTOs in `protocol` and the server
//! side in `handlers`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

pub mod handlers;
pub mod http;
pub mod protocol;


/// Client bound to one remote peer.
pub trait PeerClient: Send + Sync {
    /// Fetches the value for `(group, key)` from the peer. Any transport or
    /// protocol failure is an error; the caller decides how to recover.
    fn fetch<'a>(
        &'a self,
        group: &'a str,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

/// Chooses which peer, if any, serves a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the client for the peer owning `key`, or `None` when the
    /// owner is this node and the lookup should be answered locally.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>>;
}
