//! Local Cache Module
//!
//! Implements the node-local storage layer: an LRU store whose budget is
//! measured in bytes rather than entry counts.
//!
//! ## Core Concepts
//! - **Values**: Payloads are immutable [`ByteView`]s. Handing a view to a
//!   caller never exposes mutable access to resident data.
//! - **Accounting**: Every resident entry charges `key.len() + value.len()`
//!   against the budget; eviction removes the least recently used entries
//!   until the budget holds again.
//! - **Access**: [`SharedCache`] serializes all access behind a mutex and
//!   builds the underlying store lazily on the first insert.

mod byte_view;
mod lru;
mod shared;

pub use byte_view::ByteView;
pub use lru::{EvictionHandler, LruCache};
pub use shared::SharedCache;
