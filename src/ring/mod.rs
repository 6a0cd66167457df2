//! Key Placement Module
//!
//! Maps keys to peer nodes with a consistent-hash ring, so adding a node
//! relocates only a small slice of the keyspace instead of reshuffling
//! everything.
//!
//! ## Mechanism
//! - **Virtual nodes**: Each peer is hashed onto the ring at `replicas`
//!   positions (hash of `"<i><peer>"` for `i` in `0..replicas`), smoothing
//!   the load across peers.
//! - **Lookup**: A key's hash is matched to the first ring position at or
//!   after it via binary search, wrapping to the lowest position past the
//!   top of the 32-bit space.
//! - **Topology**: `add` is the only mutator. Removing peers is not
//!   supported; callers rebuild a fresh ring instead.

use std::collections::HashMap;

/// Hash used to place peers and keys on the ring. Injectable so tests can
/// pin the layout deterministically.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Consistent-hash ring over peer identifiers.
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    /// Sorted virtual-node positions.
    positions: Vec<u32>,
    /// Position back to the owning peer. Colliding positions overwrite;
    /// with `replicas * peers` far below 2^32 that loss is accepted.
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring using CRC-32 (IEEE) placement.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, Box::new(crc32fast::hash))
    }

    /// Creates an empty ring with a caller-supplied hash.
    pub fn with_hash(replicas: usize, hash: HashFn) -> Self {
        Self {
            replicas,
            hash,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds peers to the ring, placing `replicas` virtual nodes for each.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for peer in peers {
            let peer = peer.into();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.positions.push(position);
                self.owners.insert(position, peer.clone());
            }
            tracing::debug!("placed peer {} on the ring", peer);
        }
        self.positions.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());

        // First position at or after the key's hash, wrapping to the start.
        let idx = self.positions.partition_point(|&position| position < hash);
        let position = if idx == self.positions.len() {
            self.positions[0]
        } else {
            self.positions[idx]
        };
        self.owners.get(&position).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of virtual nodes currently placed.
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests;
