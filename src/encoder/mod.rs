//! Encoder source boundary and encode channels
//!
//! The hardware encoder is an external collaborator: an opaque push producer
//! of frame-delimited MJPEG byte chunks. The core only controls which
//! splitter ports are attached, never the encoder's configuration.
//!
//! Each attached port gets its own encode channel: a pump task that receives
//! the shared chunk sequence and writes it into one sink. Every port sees the
//! same chunks, independently paced; a slow viewer lags (and drops frames)
//! without holding back the others.

pub mod bus;
pub mod channel;

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::error::Result;

pub use bus::FrameBus;
pub use channel::spawn_encode_channel;

/// Attach/detach boundary to the frame producer
///
/// Implementations wrap whatever actually produces the chunks: the in-process
/// [`FrameBus`], a capture pipeline, or a test fixture.
pub trait EncoderSource: Send + Sync + 'static {
    /// Number of splitter ports the encoder can drive simultaneously
    fn ports(&self) -> usize;

    /// Attach a port, returning the receiver its encode channel pumps from
    fn attach(&self, port: usize) -> Result<broadcast::Receiver<Bytes>>;

    /// Detach a port, releasing its encode resource
    fn detach(&self, port: usize);
}
