//! Encode channel pump
//!
//! One task per attached splitter port: receive the next chunk, write it into
//! the port's sink, flush. Sink-level failures stay inside the sink; the pump
//! only exits when the encoder itself stops producing.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::sink::VideoSink;

/// Spawn the pump task for one (port, sink) pair
///
/// The returned handle is aborted by the connection monitor when the port's
/// viewer goes away; the slot-0 handle runs for the server's lifetime and
/// finishing on its own means the encoder died. The sink locks per
/// destination internally, so a pump blocked on one viewer's socket holds
/// nothing any other task needs.
pub fn spawn_encode_channel(
    port: usize,
    mut rx: broadcast::Receiver<Bytes>,
    sink: Arc<VideoSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(chunk) => {
                    sink.write(&chunk).await;
                    sink.flush().await;
                }
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    tracing::warn!(port, dropped, "Encode channel lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::error!(port, "Encoder source stopped");
                    break;
                }
            }
        }
    })
}
