//! # relay-rs
//!
//! A live-stream relay: one producer pushes an opaque binary media stream
//! (typically MPEG-TS out of a transcoder) over a long-lived HTTP request,
//! and the server fans every chunk out to any number of WebSocket viewers,
//! optionally tee-ing the session to an append-only recording file.
//!
//! ```text
//!  transcoder ──HTTP /<secret>/──► [Ingest Listener]
//!                                        │ chunk
//!                                        ▼
//!                                 [ViewerRegistry] ──try_send──► viewer queue ──► WebSocket
//!                                        │     └───try_send──► viewer queue ──► WebSocket
//!                                        ▼
//!                                 [RecordingSink] ──► recordings/<ts>.ts
//! ```
//!
//! Delivery is best-effort and at-most-once: viewers that fall behind are
//! dropped, never buffered indefinitely, and nothing a viewer does can slow
//! the producer path. Each viewer receives an 8-byte header on connect
//! (magic marker plus stream dimensions), then every chunk broadcast while
//! it was registered, verbatim and in order.
//!
//! # Example
//!
//! ```no_run
//! use relay_rs::{RelayConfig, RelayServer};
//!
//! # async fn example() -> relay_rs::error::Result<()> {
//! let config = RelayConfig::with_secret("supersecret")
//!     .dimensions(1280, 720)
//!     .record_to("recordings");
//!
//! RelayServer::new(config)?.run().await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod protocol;
pub mod recording;
pub mod registry;
pub mod server;
pub mod stats;
pub mod viewer;

pub use config::RelayConfig;
pub use error::{Error, Result};
pub use protocol::StreamHeader;
pub use registry::ViewerRegistry;
pub use server::{RelayHandle, RelayServer};
