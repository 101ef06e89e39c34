//! Crate-wide error types
//!
//! Error types shared by the relay server components.

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay operations
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O failure (bind, file create, file write)
    Io(std::io::Error),
    /// Invalid configuration, surfaced at startup
    Config(String),
    /// The recording sink is no longer accepting writes
    SinkClosed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::SinkClosed => write!(f, "Recording sink is closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
