//! Stream header construction
//!
//! Every consumer receives a fixed 8-byte preamble before any stream data,
//! identifying the stream format and its dimensions:
//!
//! ```text
//! +-------------+------------+------------+
//! | Magic (4)   | Width (2)  | Height (2) |
//! | "jsmp"      | u16 BE     | u16 BE     |
//! +-------------+------------+------------+
//! ```
//!
//! The header is built once from validated configuration and re-sent, with
//! the same value, to each new consumer connection.

use bytes::Bytes;

/// ASCII magic marker identifying the stream format
pub const STREAM_MAGIC: &[u8; 4] = b"jsmp";

/// Total encoded header length in bytes
pub const HEADER_LEN: usize = 8;

/// The 8-byte stream preamble sent to every new consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    /// Video width in pixels
    pub width: u16,
    /// Video height in pixels
    pub height: u16,
}

impl StreamHeader {
    /// Create a new header with the given dimensions
    ///
    /// Dimensions are validated at configuration time
    /// (`RelayConfig::validate`), not here.
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Encode the header into its 8-byte wire form
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(STREAM_MAGIC);
        buf[4..6].copy_from_slice(&self.width.to_be_bytes());
        buf[6..8].copy_from_slice(&self.height.to_be_bytes());
        buf
    }

    /// Encode into a reference-counted buffer, cheap to clone per consumer
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = StreamHeader::new(1280, 720);
        let encoded = header.encode();

        assert_eq!(encoded.len(), HEADER_LEN);
        assert_eq!(&encoded[0..4], b"jsmp");
        assert_eq!(encoded[4..6], 1280u16.to_be_bytes());
        assert_eq!(encoded[6..8], 720u16.to_be_bytes());
    }

    #[test]
    fn test_dimensions_round_trip() {
        for (w, h) in [(1u16, 1u16), (320, 240), (1920, 1080), (65535, 65535)] {
            let encoded = StreamHeader::new(w, h).encode();
            let width = u16::from_be_bytes([encoded[4], encoded[5]]);
            let height = u16::from_be_bytes([encoded[6], encoded[7]]);
            assert_eq!((width, height), (w, h));
        }
    }

    #[test]
    fn test_same_value_each_encoding() {
        let header = StreamHeader::new(640, 480);
        assert_eq!(header.encode(), header.encode());
        assert_eq!(header.to_bytes(), Bytes::copy_from_slice(&header.encode()));
    }
}
