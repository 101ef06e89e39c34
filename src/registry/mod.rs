//! Viewer registry and broadcast fan-out
//!
//! The registry tracks the live set of consumer connections and copies each
//! ingest chunk to all of them. Delivery is best-effort and at-most-once: a
//! viewer that cannot accept the current chunk is dropped rather than
//! buffered indefinitely, so the producer path never slows down for a slow
//! consumer.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<ViewerRegistry>
//!                   ┌──────────────────────────┐
//!                   │ viewers: HashMap<u64,    │
//!                   │   ViewerEntry {          │
//!                   │     tx: mpsc::Sender,    │
//!                   │   }                      │
//!                   │ >                        │
//!                   └────────────┬─────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Producer]              [Viewer]                [Viewer]
//!   ingest loop             rx.recv()               rx.recv()
//!        │                       │                       │
//!        └──► registry.broadcast() ──► try_send ──► WebSocket
//! ```
//!
//! # Zero-Copy Design
//!
//! Chunks are `bytes::Bytes`, so the per-viewer clones made during a
//! broadcast pass are reference-count bumps over one shared allocation.

pub mod entry;
pub mod store;

pub use entry::ViewerEntry;
pub use store::ViewerRegistry;
