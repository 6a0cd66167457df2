//! Cache API Handlers
//!
//! HTTP endpoints a node serves to its peers. The lookup handler bridges
//! the Axum router into `Group::get`; whatever that produces — local hit,
//! remote fetch, or origin load — is streamed back as raw bytes.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::http::HttpPool;
use super::protocol::{GroupStats, NodeStatsResponse, ENDPOINT_STATS};
use crate::error::CacheError;
use crate::group::{get_group, list_groups};

/// Peer lookup: `GET <base>/:group/:key`.
///
/// Responds 404 for an unknown group, 500 when the load fails, and the
/// value bytes as `application/octet-stream` on success.
pub async fn handle_peer_lookup(Path((group_name, key)): Path<(String, String)>) -> Response {
    let Some(group) = get_group(&group_name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("no such group: {}", group_name),
        )
            .into_response();
    };

    match group.get(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(CacheError::KeyRequired) => {
            (StatusCode::BAD_REQUEST, CacheError::KeyRequired.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("lookup {}/{} failed: {}", group_name, key, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Node diagnostics: `GET /health/stats`.
pub async fn handle_stats(Extension(pool): Extension<Arc<HttpPool>>) -> Json<NodeStatsResponse> {
    let groups = list_groups()
        .into_iter()
        .map(|group| GroupStats {
            name: group.name().to_string(),
            entries: group.cached_entries(),
            used_bytes: group.cached_bytes(),
        })
        .collect();

    Json(NodeStatsResponse {
        self_url: pool.self_url().to_string(),
        peers: pool.peer_urls(),
        groups,
    })
}

/// Builds the router a node serves to its peers.
pub fn peer_router(pool: Arc<HttpPool>) -> Router {
    Router::new()
        .route(
            &format!("{}/:group/:key", pool.base_path()),
            get(handle_peer_lookup),
        )
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(pool))
}
