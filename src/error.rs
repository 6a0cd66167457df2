//! Caller-facing error type for group lookups.
//!
//! A coalesced load produces one outcome that every waiting caller receives,
//! so the error must be cheap to hand out repeatedly. The origin loader's
//! error is kept intact behind an `Arc` instead of being flattened to a
//! string.

use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by [`crate::group::Group::get`].
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Lookup was attempted with an empty key.
    #[error("key is required")]
    KeyRequired,

    /// The origin loader failed for this key. Peer-fetch failures never
    /// appear here; they are logged and recovered by falling back to the
    /// origin within the same load.
    #[error("origin load failed: {0}")]
    Origin(Arc<anyhow::Error>),
}

impl CacheError {
    pub(crate) fn origin(err: anyhow::Error) -> Self {
        Self::Origin(Arc::new(err))
    }
}
