use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use serde::Deserialize;

use distributed_cache::group::{self, Group};
use distributed_cache::transport::handlers::peer_router;
use distributed_cache::transport::http::HttpPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> [--peer <url>]... [--api <addr:port>]",
            args[0]
        );
        eprintln!("Example: {} --bind 127.0.0.1:8001", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:8001 --peer http://127.0.0.1:8001 --peer http://127.0.0.1:8002 --api 127.0.0.1:9999",
            args[0]
        );
        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut api_addr: Option<SocketAddr> = None;
    let mut self_url: Option<String> = None;
    let mut peers: Vec<String> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--peer" => {
                peers.push(args[i + 1].clone());
                i += 2;
            }
            "--self-url" => {
                self_url = Some(args[i + 1].clone());
                i += 2;
            }
            "--api" => {
                api_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    let self_url = self_url.unwrap_or_else(|| format!("http://{}", bind_addr));
    if peers.is_empty() {
        peers.push(self_url.clone());
    }

    tracing::info!("Starting cache node {}", self_url);
    tracing::info!("Peer set: {:?}", peers);

    // 1. Demo cache group backed by an in-process "database":
    let max_bytes = std::env::var("CACHE_MAX_BYTES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(2 << 10);
    let scores = scores_group(max_bytes);

    // 2. Peer transport:
    let pool = HttpPool::new(self_url.clone());
    pool.set_peers(peers);
    scores.register_peers(pool.clone());

    // 3. Optional public API server:
    if let Some(api_addr) = api_addr {
        let api_group = scores.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_api(api_addr, api_group).await {
                tracing::error!("api server failed: {}", e);
            }
        });
    }

    // 4. Peer server:
    tracing::info!("cache server listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, peer_router(pool)).await?;

    Ok(())
}

/// Registers the demo `scores` group. The origin is a fixed in-process map
/// standing in for a slow backing database.
fn scores_group(max_bytes: usize) -> Arc<Group> {
    group::new_group("scores", max_bytes, |key: String| async move {
        tracing::info!("querying origin for key {}", key);
        let db = HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]);
        match db.get(key.as_str()) {
            Some(value) => Ok(value.as_bytes().to_vec()),
            None => Err(anyhow::anyhow!("{} not exist", key)),
        }
    })
}

#[derive(Deserialize)]
struct ApiParams {
    key: String,
}

/// Public lookup: `GET /api?key=K`.
async fn handle_api(
    Extension(group): Extension<Arc<Group>>,
    Query(params): Query<ApiParams>,
) -> Response {
    match group.get(&params.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn serve_api(addr: SocketAddr, group: Arc<Group>) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/api", get(handle_api))
        .layer(Extension(group));

    tracing::info!("api server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
