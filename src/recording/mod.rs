//! Best-effort recording of ingest sessions
//!
//! Recording is a side channel of the relay: each ingest session may own
//! one append-only file, and a recording failure never interrupts delivery
//! to live viewers.

pub mod sink;

pub use sink::RecordingSink;
