//! Producer ingest endpoint
//!
//! Accepts the single long-lived HTTP request carrying the media stream.
//! The first path segment must equal the configured shared secret; the
//! request body is relayed chunk-by-chunk to the viewer registry and,
//! optionally, teed to a recording sink. No read timeout is applied: an
//! authenticated session is long-lived and chunk arrival is bursty.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use futures::StreamExt;

use crate::config::RelayConfig;
use crate::ingest::session::IngestSession;
use crate::recording::RecordingSink;
use crate::registry::ViewerRegistry;
use crate::stats::ServerStats;

/// Shared state for the ingest router
#[derive(Clone)]
pub struct IngestState {
    registry: Arc<ViewerRegistry>,
    stats: Arc<ServerStats>,
    secret: Arc<str>,
    record: bool,
    recordings_dir: PathBuf,
    recording_ext: String,
    record_queue: usize,
    /// Single-producer slot; see `ProducerSlot`
    active: Arc<AtomicBool>,
}

impl IngestState {
    pub fn new(
        config: &RelayConfig,
        registry: Arc<ViewerRegistry>,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            registry,
            stats,
            secret: config.secret.as_str().into(),
            record: config.record,
            recordings_dir: config.recordings_dir.clone(),
            recording_ext: config.recording_ext.clone(),
            record_queue: config.record_queue,
            active: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Build the ingest router
///
/// Any method is accepted on any path; authentication happens inside the
/// handler against the first path segment, like the original's
/// `/<secret>/...` scheme.
pub fn router(state: IngestState) -> Router {
    Router::new()
        .route("/{*path}", any(ingest_handler))
        .with_state(state)
}

/// Exclusive producer slot, freed on drop
///
/// Exactly one ingest session may stream at a time; a second authenticated
/// producer is refused while the slot is held. Drop-based release keeps the
/// slot consistent on every exit path from the handler.
struct ProducerSlot {
    active: Arc<AtomicBool>,
}

impl ProducerSlot {
    fn acquire(active: &Arc<AtomicBool>) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                active: Arc::clone(active),
            })
    }
}

impl Drop for ProducerSlot {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// First path segment, which the producer presents as its secret
fn path_secret(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or("")
}

/// Millisecond UNIX timestamp, used as the session and recording id
fn session_id_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

async fn ingest_handler(
    State(state): State<IngestState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let mut session = IngestSession::new(session_id_now(), peer);

    let presented = path_secret(request.uri().path()).to_owned();
    if presented != *state.secret {
        session.reject();
        tracing::warn!(peer = %peer, "Failed stream connection: wrong secret");
        return StatusCode::FORBIDDEN.into_response();
    }

    let _slot = match ProducerSlot::acquire(&state.active) {
        Some(slot) => slot,
        None => {
            tracing::warn!(peer = %peer, "Refusing producer: a session is already active");
            return StatusCode::CONFLICT.into_response();
        }
    };

    session.authenticate();
    state.stats.record_session();
    tracing::info!(session = session.id, peer = %peer, "Stream connected");

    if state.record {
        match RecordingSink::open(
            &state.recordings_dir,
            session.id,
            &state.recording_ext,
            state.record_queue,
        )
        .await
        {
            Ok(sink) => session.attach_recording(sink),
            Err(e) => {
                // Recording is best-effort: the session streams unrecorded
                tracing::error!(session = session.id, error = %e, "Could not open recording");
            }
        }
    }

    let mut body = request.into_body().into_data_stream();
    while let Some(next) = body.next().await {
        match next {
            Ok(chunk) => {
                if chunk.is_empty() {
                    continue;
                }
                session.on_chunk(chunk.len());
                state.stats.add_bytes(chunk.len() as u64);

                // Fan-out first; the tee must never delay live viewers
                state.registry.broadcast(chunk.clone()).await;

                if let Some(sink) = session.recording() {
                    if sink.append(chunk).is_err() {
                        tracing::warn!(
                            session = session.id,
                            "Recording stopped after write failure; relay continues"
                        );
                        if let Some(sink) = session.take_recording() {
                            let _ = sink.close().await;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    session = session.id,
                    peer = %peer,
                    error = %e,
                    "Producer connection error"
                );
                break;
            }
        }
    }

    session.close();
    if let Some(sink) = session.take_recording() {
        let path = sink.path().to_path_buf();
        match sink.close().await {
            Ok(bytes) => {
                tracing::info!(
                    session = session.id,
                    path = %path.display(),
                    bytes,
                    "Recording closed"
                );
            }
            Err(e) => {
                tracing::error!(
                    session = session.id,
                    path = %path.display(),
                    error = %e,
                    "Recording finalization failed"
                );
            }
        }
    }

    tracing::info!(
        session = session.id,
        peer = %peer,
        bytes = session.stats.bytes_received,
        chunks = session.stats.chunks,
        duration_secs = session.stats.duration().as_secs(),
        bitrate = session.stats.bitrate(),
        "Stream disconnected"
    );

    StatusCode::OK.into_response()
}
