//! Viewer registry implementation
//!
//! The central registry that tracks all connected viewers and fans ingest
//! chunks out to them.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};

use super::entry::ViewerEntry;

/// Central registry for all connected viewers
///
/// Thread-safe via `RwLock`: viewer accept/disconnect tasks take the write
/// lock briefly, while the broadcast path only needs read access to its
/// snapshot. Every broadcast pass observes a consistent point-in-time view
/// of the viewer set.
pub struct ViewerRegistry {
    /// Map of viewer id to entry
    viewers: RwLock<HashMap<u64, Arc<ViewerEntry>>>,

    /// Next viewer id to allocate
    next_id: AtomicU64,

    /// Capacity of each viewer's chunk queue
    send_queue: usize,
}

impl ViewerRegistry {
    /// Create a new registry with the given per-viewer queue capacity
    pub fn new(send_queue: usize) -> Self {
        Self {
            viewers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            send_queue: send_queue.max(1),
        }
    }

    /// Register a new viewer
    ///
    /// Allocates a unique id and a bounded chunk queue. Returns the entry
    /// and the queue's receiving half for the viewer's writer task. O(1),
    /// never fails.
    pub async fn register(&self, peer_addr: SocketAddr) -> (Arc<ViewerEntry>, mpsc::Receiver<Bytes>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.send_queue);
        let entry = Arc::new(ViewerEntry::new(id, peer_addr, tx));

        let mut viewers = self.viewers.write().await;
        viewers.insert(id, Arc::clone(&entry));

        tracing::info!(
            viewer = id,
            peer = %peer_addr,
            viewers = viewers.len(),
            "Viewer connected"
        );

        (entry, rx)
    }

    /// Unregister a viewer
    ///
    /// Idempotent: removing an id that is not registered is a no-op.
    pub async fn unregister(&self, id: u64) {
        let mut viewers = self.viewers.write().await;

        if let Some(entry) = viewers.remove(&id) {
            entry.mark_closed();
            tracing::info!(
                viewer = id,
                peer = %entry.peer_addr,
                viewers = viewers.len(),
                "Viewer disconnected"
            );
        }
    }

    /// Snapshot the currently-registered viewers for one broadcast pass
    ///
    /// Side-effect free; reflects registry state at call time.
    pub async fn snapshot(&self) -> Vec<Arc<ViewerEntry>> {
        self.viewers.read().await.values().cloned().collect()
    }

    /// Deliver a chunk to every registered viewer
    ///
    /// Each viewer's write is a non-blocking queue push; a viewer whose
    /// queue is full, closed, or mid-disconnect misses the chunk and is
    /// unregistered. One viewer's failure never aborts delivery to the
    /// rest, and nothing here surfaces to the ingest path.
    ///
    /// `Bytes` is reference counted, so per-viewer clones share the one
    /// chunk allocation.
    pub async fn broadcast(&self, chunk: Bytes) {
        let viewers = self.snapshot().await;

        let mut stale: Vec<u64> = Vec::new();
        for viewer in &viewers {
            if !viewer.send(chunk.clone()) {
                stale.push(viewer.id);
            }
        }

        for id in stale {
            tracing::warn!(viewer = id, "Dropping viewer that cannot keep up");
            self.unregister(id).await;
        }
    }

    /// Number of registered viewers
    pub async fn count(&self) -> usize {
        self.viewers.read().await.len()
    }
}
