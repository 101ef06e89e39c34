//! Relay server assembly
//!
//! Binds the producer ingest listener and the WebSocket viewer listener and
//! wires them to one shared viewer registry.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::ingest::{self, IngestState};
use crate::protocol::StreamHeader;
use crate::registry::ViewerRegistry;
use crate::stats::ServerStats;
use crate::viewer::{self, ViewerState};

/// The relay server
pub struct RelayServer {
    config: RelayConfig,
    registry: Arc<ViewerRegistry>,
    stats: Arc<ServerStats>,
    header: StreamHeader,
}

impl RelayServer {
    /// Create a new server from a validated configuration
    ///
    /// Out-of-range dimensions or a bad secret fail here, at startup,
    /// never at connection time.
    pub fn new(config: RelayConfig) -> Result<Self> {
        config.validate()?;
        let header = StreamHeader::new(config.width, config.height);
        let registry = Arc::new(ViewerRegistry::new(config.send_queue));

        Ok(Self {
            config,
            registry,
            stats: Arc::new(ServerStats::new()),
            header,
        })
    }

    /// The shared viewer registry
    pub fn registry(&self) -> &Arc<ViewerRegistry> {
        &self.registry
    }

    /// The stream header every viewer will receive
    pub fn header(&self) -> StreamHeader {
        self.header
    }

    /// Bind both listeners and start serving
    ///
    /// Returns once the sockets are bound (port 0 is supported for tests);
    /// serving continues on background tasks owned by the returned handle.
    pub async fn start(self) -> Result<RelayHandle> {
        let ingest_listener = TcpListener::bind(self.config.stream_addr).await?;
        let ws_listener = TcpListener::bind(self.config.ws_addr).await?;
        let stream_addr = ingest_listener.local_addr()?;
        let ws_addr = ws_listener.local_addr()?;

        let ingest_router = ingest::router(IngestState::new(
            &self.config,
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
        ));
        let viewer_router = viewer::router(ViewerState::new(
            self.header,
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
        ));

        tracing::info!(addr = %stream_addr, "Listening for incoming stream");
        tracing::info!(addr = %ws_addr, "Awaiting WebSocket connections");

        let ingest_task = tokio::spawn(async move {
            axum::serve(
                ingest_listener,
                ingest_router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        });
        let ws_task = tokio::spawn(async move {
            axum::serve(
                ws_listener,
                viewer_router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        });

        Ok(RelayHandle {
            stream_addr,
            ws_addr,
            ingest_task,
            ws_task,
        })
    }

    /// Run the server until one of the listeners fails
    pub async fn run(self) -> Result<()> {
        self.start().await?.wait().await
    }
}

/// Handle to a started relay; owns the serving tasks
pub struct RelayHandle {
    /// Bound ingest address
    pub stream_addr: SocketAddr,
    /// Bound WebSocket address
    pub ws_addr: SocketAddr,
    ingest_task: JoinHandle<std::io::Result<()>>,
    ws_task: JoinHandle<std::io::Result<()>>,
}

impl RelayHandle {
    /// Block until either listener stops
    pub async fn wait(self) -> Result<()> {
        let (ingest, ws) = tokio::try_join!(self.ingest_task, self.ws_task)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        ingest?;
        ws?;
        Ok(())
    }

    /// Stop serving immediately
    pub fn shutdown(self) {
        self.ingest_task.abort();
        self.ws_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(RelayServer::new(RelayConfig::default()).is_err());
        assert!(RelayServer::new(RelayConfig::with_secret("k").dimensions(0, 1)).is_err());
    }

    #[test]
    fn test_header_built_from_config() {
        let server = RelayServer::new(RelayConfig::with_secret("k").dimensions(320, 240)).unwrap();
        assert_eq!(server.header(), StreamHeader::new(320, 240));
    }

    #[tokio::test]
    async fn test_start_binds_ephemeral_ports() {
        let config = RelayConfig::with_secret("k")
            .stream_addr("127.0.0.1:0".parse().unwrap())
            .ws_addr("127.0.0.1:0".parse().unwrap());
        let server = RelayServer::new(config).unwrap();

        let handle = server.start().await.unwrap();
        assert_ne!(handle.stream_addr.port(), 0);
        assert_ne!(handle.ws_addr.port(), 0);
        handle.shutdown();
    }
}
