//! Distributed Cache Node Library
//!
//! This library crate defines the core modules of a peer-to-peer in-memory
//! key/value cache. Each node owns a slice of the keyspace chosen by
//! consistent hashing; lookups that miss locally are routed to the owning
//! peer, or fall back to a caller-supplied origin loader.
//!
//! ## Architecture Modules
//! The system is composed of five loosely coupled subsystems:
//!
//! - **`cache`**: The local storage layer. A byte-accounted LRU store behind
//!   a mutex, holding immutable `ByteView` payloads.
//! - **`ring`**: The placement layer. A consistent-hash ring with virtual
//!   nodes that maps every key to exactly one peer.
//! - **`singleflight`**: The request coalescer. Concurrent loads of the same
//!   key collapse into a single execution whose outcome all callers share.
//! - **`group`**: The orchestrator. A named cache namespace that wires the
//!   local store, the coalescer, the peer picker and the origin loader into
//!   one `get` path.
//! - **`transport`**: The wire layer. Peer picking and fetching contracts,
//!   plus the HTTP pool/client/handlers that implement them.

pub mod cache;
pub mod error;
pub mod group;
pub mod ring;
pub mod singleflight;
pub mod transport;
