//! WebSocket consumer endpoint
//!
//! Each viewer connects with a plain WebSocket upgrade, receives the 8-byte
//! stream header as its first binary message, and then every broadcast
//! chunk as its own binary message, verbatim, in arrival order. A viewer
//! that closes or errors is unregistered immediately.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};

use crate::protocol::StreamHeader;
use crate::registry::ViewerRegistry;
use crate::stats::ServerStats;

/// Shared state for the viewer router
#[derive(Clone)]
pub struct ViewerState {
    registry: Arc<ViewerRegistry>,
    stats: Arc<ServerStats>,
    /// Pre-encoded stream header, identical for every viewer
    header: Bytes,
}

impl ViewerState {
    pub fn new(
        header: StreamHeader,
        registry: Arc<ViewerRegistry>,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            registry,
            stats,
            header: header.to_bytes(),
        }
    }
}

/// Build the viewer router
pub fn router(state: ViewerState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<ViewerState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// Handle one viewer connection for its whole lifetime
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: ViewerState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Membership starts here. Chunks broadcast while the header write is
    // in flight wait in the queue and follow the header in order, so the
    // viewer always observes: header first, then every chunk since
    // registration.
    let (viewer, mut rx) = state.registry.register(peer).await;
    state.stats.record_viewer();

    if ws_tx
        .send(Message::Binary(state.header.clone()))
        .await
        .is_err()
    {
        viewer.mark_closed();
        state.registry.unregister(viewer.id).await;
        return;
    }

    // Writer: drain the chunk queue onto the socket. Socket latency shows
    // up as queue depth, never as broadcast-path blocking.
    let writer = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            if ws_tx.send(Message::Binary(chunk)).await.is_err() {
                break;
            }
        }
    });

    // Reader: viewers send nothing the relay consumes; drain until close.
    // Pings are answered by axum automatically.
    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    viewer.mark_closed();
    state.registry.unregister(viewer.id).await;
}

/// Liveness probe with the relay's headline counters
async fn health_handler(State(state): State<ViewerState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "viewers": state.registry.count().await,
        "total_viewers": state.stats.viewers(),
        "total_sessions": state.stats.sessions(),
        "bytes_relayed": state.stats.bytes(),
    }))
}
