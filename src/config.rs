//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Relay server configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the producer ingest endpoint binds to
    pub stream_addr: SocketAddr,

    /// Address the WebSocket consumer endpoint binds to
    pub ws_addr: SocketAddr,

    /// Shared secret the producer must present as the first path segment
    pub secret: String,

    /// Video width advertised in the stream header
    pub width: u16,

    /// Video height advertised in the stream header
    pub height: u16,

    /// Record each ingest session to a local file
    pub record: bool,

    /// Directory recording files are created in
    pub recordings_dir: PathBuf,

    /// File extension for recordings (the producer's container format)
    pub recording_ext: String,

    /// Per-viewer send queue capacity; a viewer whose queue fills is dropped
    pub send_queue: usize,

    /// Recording sink queue capacity; a full queue fails the sink
    pub record_queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            stream_addr: "0.0.0.0:8081".parse().unwrap(),
            ws_addr: "0.0.0.0:8082".parse().unwrap(),
            secret: String::new(),
            width: 1920,
            height: 1080,
            record: false,
            recordings_dir: PathBuf::from("recordings"),
            recording_ext: "ts".into(),
            send_queue: 256,
            record_queue: 256,
        }
    }
}

impl RelayConfig {
    /// Create a new config with the given shared secret
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set the ingest bind address
    pub fn stream_addr(mut self, addr: SocketAddr) -> Self {
        self.stream_addr = addr;
        self
    }

    /// Set the WebSocket bind address
    pub fn ws_addr(mut self, addr: SocketAddr) -> Self {
        self.ws_addr = addr;
        self
    }

    /// Set the advertised stream dimensions
    pub fn dimensions(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable recording into the given directory
    pub fn record_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.record = true;
        self.recordings_dir = dir.into();
        self
    }

    /// Set the recording file extension
    pub fn recording_ext(mut self, ext: impl Into<String>) -> Self {
        self.recording_ext = ext.into();
        self
    }

    /// Set the per-viewer send queue capacity
    pub fn send_queue(mut self, capacity: usize) -> Self {
        self.send_queue = capacity.max(1);
        self
    }

    /// Validate the configuration
    ///
    /// Dimension and secret problems are startup errors; nothing here is
    /// checked again at connection time.
    pub fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(Error::Config("secret must not be empty".into()));
        }
        if self.secret.contains('/') {
            return Err(Error::Config(
                "secret must not contain '/' (it is matched as one path segment)".into(),
            ));
        }
        if self.width == 0 {
            return Err(Error::Config("width must be non-zero".into()));
        }
        if self.height == 0 {
            return Err(Error::Config("height must be non-zero".into()));
        }
        Ok(())
    }
}
