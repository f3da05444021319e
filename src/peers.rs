//! Peer tracker: polls `admin_peers` on a fixed interval, remembers every peer
//! id ever seen, and serves the collection over HTTP at `GET /peers`.

use crate::errors::{BootError, Result};
use crate::rpc::RpcTransport;
use crate::ticker::{StopSignal, Ticker};
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const DEFAULT_API_PORT: u16 = 3009;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Unique peer ids in first-seen order.
#[derive(Debug, Default)]
pub struct PeerBook {
    ids: Vec<String>,
    seen: HashSet<String>,
}

impl PeerBook {
    /// Returns false if the id was already known.
    pub fn insert(&mut self, id: &str) -> bool {
        if !self.seen.insert(id.to_string()) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

pub type SharedPeerBook = Arc<Mutex<PeerBook>>;

fn lock(book: &Mutex<PeerBook>) -> MutexGuard<'_, PeerBook> {
    // The book stays consistent even if a holder panicked mid-insert.
    book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One `admin_peers` round: records every peer carrying a non-empty id and
/// returns how many peers the node reported.
pub fn fetch_peers<R: RpcTransport>(rpc: &R, book: &Mutex<PeerBook>) -> Result<usize> {
    let body = rpc.call("admin_peers", json!([]))?;
    let peers = body
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| BootError::RpcResponse {
            method: "admin_peers".to_string(),
            body: body.to_string(),
        })?;

    let mut book = lock(book);
    for id in peers
        .iter()
        .filter_map(|peer| peer.get("id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
    {
        book.insert(id);
    }
    Ok(peers.len())
}

/// Polls until `stop` is raised. Failed rounds are logged and retried on the
/// next tick.
pub fn poll_peers<R: RpcTransport>(rpc: &R, book: &Mutex<PeerBook>, interval: Duration, stop: StopSignal) {
    let mut ticker = Ticker::new(interval, stop);
    while ticker.tick() {
        match fetch_peers(rpc, book) {
            Ok(fetched) => tracing::info!(
                "Fetched {} peers, current unique peers count: {}",
                fetched,
                lock(book).len()
            ),
            Err(e) => tracing::error!("Failed to fetch peers: {}", e),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PeersResponse {
    pub success: bool,
    #[serde(rename = "totalPeers")]
    pub total_peers: usize,
    pub peers: Vec<String>,
}

pub(crate) async fn list_peers(State(book): State<SharedPeerBook>) -> Json<PeersResponse> {
    let book = lock(&book);
    Json(PeersResponse {
        success: true,
        total_peers: book.len(),
        peers: book.ids().to_vec(),
    })
}

pub fn router(book: SharedPeerBook) -> Router {
    Router::new().route("/peers", get(list_peers)).with_state(book)
}

/// Serves `GET /peers` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    book: SharedPeerBook,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server is running on http://{}", addr);

    axum::serve(listener, router(book))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
