//! Ingest session state machine
//!
//! Tracks one producer connection from accept to close.

use std::net::SocketAddr;

use crate::recording::RecordingSink;
use crate::stats::SessionStats;

/// Lifecycle phase of a producer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connection accepted, secret not yet checked
    Pending,
    /// Secret mismatch; terminal
    Rejected,
    /// Secret matched, body not yet flowing
    Authenticated,
    /// Body chunks are being relayed
    Streaming,
    /// Producer finished or errored; terminal
    Closed,
}

/// State for one producer connection
///
/// At most one session is past `Pending` at a time; the listener enforces
/// the single-producer policy before authenticating.
pub struct IngestSession {
    /// Session id, also used to name the recording file
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Bytes/chunks received so far
    pub stats: SessionStats,

    /// Recording tee, if enabled and healthy
    recording: Option<RecordingSink>,
}

impl IngestSession {
    /// Create a new pending session
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Pending,
            stats: SessionStats::new(),
            recording: None,
        }
    }

    /// Reject the session (secret mismatch)
    pub fn reject(&mut self) {
        if self.phase == SessionPhase::Pending {
            self.phase = SessionPhase::Rejected;
        }
    }

    /// Mark the session authenticated
    pub fn authenticate(&mut self) {
        if self.phase == SessionPhase::Pending {
            self.phase = SessionPhase::Authenticated;
        }
    }

    /// Attach the session's recording sink
    pub fn attach_recording(&mut self, sink: RecordingSink) {
        self.recording = Some(sink);
    }

    /// The recording sink, if one is open
    pub fn recording(&self) -> Option<&RecordingSink> {
        self.recording.as_ref()
    }

    /// Detach the recording sink (for closing, or after an append error)
    pub fn take_recording(&mut self) -> Option<RecordingSink> {
        self.recording.take()
    }

    /// Record one received chunk
    pub fn on_chunk(&mut self, size: usize) {
        if self.phase == SessionPhase::Authenticated {
            self.phase = SessionPhase::Streaming;
        }
        self.stats.on_chunk(size);
    }

    /// Close the session
    pub fn close(&mut self) {
        if !self.is_terminal() {
            self.phase = SessionPhase::Closed;
        }
    }

    /// Whether the session reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Rejected | SessionPhase::Closed)
    }

    /// Whether the session is relaying chunks
    pub fn is_streaming(&self) -> bool {
        self.phase == SessionPhase::Streaming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 50000)
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = IngestSession::new(1, peer());
        assert_eq!(session.phase, SessionPhase::Pending);

        session.authenticate();
        assert_eq!(session.phase, SessionPhase::Authenticated);
        assert!(!session.is_streaming());

        session.on_chunk(188);
        assert_eq!(session.phase, SessionPhase::Streaming);
        assert!(session.is_streaming());
        assert_eq!(session.stats.bytes_received, 188);
        assert_eq!(session.stats.chunks, 1);

        session.close();
        assert_eq!(session.phase, SessionPhase::Closed);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut session = IngestSession::new(2, peer());

        session.reject();
        assert_eq!(session.phase, SessionPhase::Rejected);
        assert!(session.is_terminal());

        // Terminal: neither authenticate nor close moves the phase
        session.authenticate();
        assert_eq!(session.phase, SessionPhase::Rejected);
        session.close();
        assert_eq!(session.phase, SessionPhase::Rejected);
    }

    #[test]
    fn test_no_recording_by_default() {
        let mut session = IngestSession::new(3, peer());
        assert!(session.recording().is_none());
        assert!(session.take_recording().is_none());
    }

    #[tokio::test]
    async fn test_attach_and_take_recording() {
        let dir = tempfile::tempdir().unwrap();
        let sink = crate::recording::RecordingSink::open(dir.path(), 3, "ts", 4)
            .await
            .unwrap();

        let mut session = IngestSession::new(3, peer());
        session.attach_recording(sink);
        assert!(session.recording().is_some());

        let sink = session.take_recording().unwrap();
        assert!(session.recording().is_none());
        sink.close().await.unwrap();
    }
}
