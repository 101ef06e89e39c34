//! Statistics for ingest sessions and the server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-session ingest statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Total bytes received from the producer
    pub bytes_received: u64,
    /// Number of body chunks received
    pub chunks: u64,
    /// When the session started streaming
    pub started_at: Instant,
}

impl SessionStats {
    /// Create new stats, starting the clock now
    pub fn new() -> Self {
        Self {
            bytes_received: 0,
            chunks: 0,
            started_at: Instant::now(),
        }
    }

    /// Record one received chunk
    pub fn on_chunk(&mut self, size: usize) {
        self.bytes_received += size as u64;
        self.chunks += 1;
    }

    /// Session duration so far
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Ingest bitrate estimate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_received * 8) / secs
        } else {
            0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-wide counters
///
/// Shared across the ingest and viewer listeners; all counters are
/// monotonic totals over the process lifetime.
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Viewer connections ever accepted
    pub total_viewers: AtomicU64,
    /// Ingest sessions ever authenticated
    pub total_sessions: AtomicU64,
    /// Bytes relayed from producers to the fan-out engine
    pub bytes_relayed: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new viewer connection
    pub fn record_viewer(&self) {
        let _ = self.total_viewers.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a new authenticated ingest session
    pub fn record_session(&self) {
        let _ = self.total_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Add relayed bytes
    pub fn add_bytes(&self, bytes: u64) {
        let _ = self.bytes_relayed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn viewers(&self) -> u64 {
        self.total_viewers.load(Ordering::Relaxed)
    }

    pub fn sessions(&self) -> u64 {
        self.total_sessions.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes_relayed.load(Ordering::Relaxed)
    }
}
