//! Cache Network Protocol
//!
//! Defines the endpoints and DTOs a node serves to its peers. Lookups are
//! addressed entirely through the URL (`<base>/<group>/<key>`, key segment
//! percent-encoded) and answered with the raw value bytes, so the hot path
//! carries no envelope at all. Only diagnostics use JSON.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Prefix under which peer lookups are served.
pub const DEFAULT_BASE_PATH: &str = "/_cache";
/// Diagnostic endpoint reporting this node's groups and peer set.
pub const ENDPOINT_STATS: &str = "/health/stats";

// --- Data Transfer Objects ---

/// Per-group cache occupancy.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupStats {
    /// Group name.
    pub name: String,
    /// Resident entries in the local cache.
    pub entries: usize,
    /// Bytes charged against the local cache budget.
    pub used_bytes: usize,
}

/// Response format for the stats endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeStatsResponse {
    /// This node's advertised URL.
    pub self_url: String,
    /// The configured peer set, including this node.
    pub peers: Vec<String>,
    /// All groups registered in this process.
    pub groups: Vec<GroupStats>,
}
