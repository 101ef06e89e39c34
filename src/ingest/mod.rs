//! Producer-side ingest
//!
//! One producer at a time pushes the media stream over a long-lived HTTP
//! request whose first path segment is the shared secret. The listener
//! relays each body chunk to the viewer registry in arrival order and tees
//! it to the session's recording sink when enabled.

pub mod listener;
pub mod session;

pub use listener::{router, IngestState};
pub use session::{IngestSession, SessionPhase};
