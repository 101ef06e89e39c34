//! Consumer-side WebSocket delivery
//!
//! Viewers join and leave independently of the producer and of each other.
//! Each connection gets the stream header on upgrade, then the live chunk
//! stream for as long as it keeps up.

pub mod listener;

pub use listener::{router, ViewerState};
