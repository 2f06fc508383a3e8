//! Crate-level error types
//!
//! Transient per-connection failures (broken pipes, resets) are handled and
//! logged where they occur and never surface through this type; what remains
//! here is what a caller can actually act on.

use std::io;

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server and encoder operations
#[derive(Debug)]
pub enum Error {
    /// Underlying I/O failure (listener setup, file rotation, etc.)
    Io(io::Error),
    /// All sink slots hold a live viewer; the connection was rejected
    PoolExhausted {
        /// Number of slots in the pool
        capacity: usize,
    },
    /// An encoder port outside the pool's range was requested
    PortOutOfRange(usize),
    /// The encoder source stopped producing frames
    EncoderStopped,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::PoolExhausted { capacity } => {
                write!(f, "All {} sink slots are in use", capacity)
            }
            Error::PortOutOfRange(port) => write!(f, "Encoder port out of range: {}", port),
            Error::EncoderStopped => write!(f, "Encoder source stopped"),
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

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
