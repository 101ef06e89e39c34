//! Viewer entry types
//!
//! This module defines the per-viewer state stored in the registry.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;

/// One registered consumer connection
///
/// Owns the sending half of the viewer's bounded chunk queue. The receiving
/// half is drained by the viewer's socket writer task, so a slow socket
/// never blocks the broadcast path.
pub struct ViewerEntry {
    /// Process-unique viewer id
    pub id: u64,

    /// Remote peer address, kept for logging
    pub peer_addr: SocketAddr,

    /// Chunk queue to the viewer's writer task
    tx: mpsc::Sender<Bytes>,

    /// When the viewer connected
    pub connected_at: Instant,

    /// Set once the connection is closing; writes are refused from then on
    closed: AtomicBool,

    /// Chunks not delivered because the queue was full or closed
    pub dropped_chunks: AtomicU64,
}

impl ViewerEntry {
    /// Create a new entry
    pub(super) fn new(id: u64, peer_addr: SocketAddr, tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            peer_addr,
            tx,
            connected_at: Instant::now(),
            closed: AtomicBool::new(false),
            dropped_chunks: AtomicU64::new(0),
        }
    }

    /// Queue a chunk for delivery without blocking
    ///
    /// Returns `false` if the viewer is closing or its queue is full or
    /// disconnected; the caller treats that as a signal to unregister.
    pub fn send(&self, chunk: Bytes) -> bool {
        if self.closed.load(Ordering::Relaxed) {
            return false;
        }
        if self.tx.try_send(chunk).is_ok() {
            true
        } else {
            let _ = self.dropped_chunks.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Mark the viewer as closing
    ///
    /// In-flight broadcasts skip the entry immediately, before the registry
    /// removal completes.
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    /// Whether the viewer has been marked as closing
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Total chunks dropped for this viewer
    pub fn drop_count(&self) -> u64 {
        self.dropped_chunks.load(Ordering::Relaxed)
    }

    /// How long the viewer has been connected
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
