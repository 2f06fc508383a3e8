//! Video sink dispatcher
//!
//! A [`VideoSink`] routes each encoded chunk to its destinations in a fixed
//! order: file first (split sinks only), then network. The two destinations
//! fail independently and are locked independently, so a slow or stalled
//! viewer socket can delay nothing but its own slot's network writes: slot
//! allocation reads a lock-free activity flag, and the recording controller
//! only ever takes the file-side lock.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::pool::ActiveStreams;
use super::writer::{FileChannel, NetChannel, NetHandle};

/// One slot's sink: a network channel plus, for the split sink, a file channel
///
/// The sink itself lives for the whole server lifetime; only its handles are
/// swapped as viewers come and go and the recording file rotates. All methods
/// take `&self`: the pool shares sinks as plain `Arc`s and each destination
/// carries its own lock.
pub struct VideoSink {
    slot: usize,
    /// Viewer liveness, readable without any lock
    ///
    /// Set on bind (or a pool claim ahead of one), cleared on write failure
    /// and close. The active-stream counter is only ever adjusted while
    /// holding the net lock, keyed to the handle actually changing hands, so
    /// the flag can be an advisory fast path without double counting.
    active: AtomicBool,
    net: Mutex<NetChannel>,
    file: Option<Mutex<FileChannel>>,
    streams: Arc<ActiveStreams>,
}

impl VideoSink {
    /// Create a streaming sink (network destination only)
    pub(crate) fn streaming(slot: usize, streams: Arc<ActiveStreams>) -> Self {
        Self {
            slot,
            active: AtomicBool::new(false),
            net: Mutex::new(NetChannel::new()),
            file: None,
            streams,
        }
    }

    /// Create a split sink (network plus recording file)
    pub(crate) fn split(slot: usize, streams: Arc<ActiveStreams>) -> Self {
        Self {
            slot,
            active: AtomicBool::new(false),
            net: Mutex::new(NetChannel::new()),
            file: Some(Mutex::new(FileChannel::new())),
            streams,
        }
    }

    /// The pool slot this sink occupies
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Whether a live viewer connection is attached
    ///
    /// Lock-free, so the pool scan and the connection monitors keep working
    /// while a network write is in flight.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Whether writes currently land in the recording file
    pub async fn is_recording(&self) -> bool {
        match &self.file {
            Some(file) => file.lock().await.is_recording(),
            None => false,
        }
    }

    /// Whether this sink carries a file channel (the split sink at slot 0)
    pub fn is_split(&self) -> bool {
        self.file.is_some()
    }

    /// Reserve an inactive sink for an incoming bind
    ///
    /// Flips the activity flag if and only if it was clear. Allocation uses
    /// this instead of waiting on the net lock: a sink mid-write is active
    /// and gets skipped rather than awaited.
    pub(crate) fn claim(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Write one chunk to every attached destination
    ///
    /// File before network, per write call. A destination failure disables
    /// that destination only; the error never reaches the encoder pump. Each
    /// destination is locked only for its own write, so the recording side
    /// never waits behind a stalled viewer socket.
    pub async fn write(&self, chunk: &[u8]) {
        if let Some(file) = &self.file {
            if let Err(e) = file.lock().await.write(chunk).await {
                tracing::warn!(slot = self.slot, error = %e, "Recording write failed, recording disabled");
            }
        }

        if self.is_active() {
            let mut net = self.net.lock().await;
            if let Err(e) = net.write(chunk).await {
                // The channel already tore the handle down; release the
                // stream slot while still holding the net lock so close()
                // cannot release it a second time
                self.active.store(false, Ordering::Release);
                self.streams.release();
                tracing::debug!(
                    slot = self.slot,
                    active_streams = self.streams.count(),
                    error = %e,
                    "Viewer connection lost"
                );
            }
        }
    }

    /// Flush whichever destinations are attached
    pub async fn flush(&self) {
        if let Some(file) = &self.file {
            file.lock().await.flush().await;
        }
        self.net.lock().await.flush().await;
    }

    /// Attach a viewer connection, replacing any previous one
    ///
    /// The active-stream count grows only when no handle was attached before;
    /// a re-bind does not double-count.
    pub async fn bind(&self, handle: NetHandle) {
        let rebind = {
            let mut net = self.net.lock().await;
            let rebind = net.attach(handle).await;
            if !rebind {
                self.streams.acquire();
            }
            self.active.store(true, Ordering::Release);
            rebind
        };

        tracing::debug!(
            slot = self.slot,
            rebind,
            active_streams = self.streams.count(),
            "Viewer bound to sink"
        );
    }

    /// The file channel of a split sink; recording-controller use only
    ///
    /// Holding the returned lock across a sync-rename-reopen sequence is what
    /// keeps rotation atomic with respect to in-flight encoder writes.
    pub(crate) fn file_channel(&self) -> Option<&Mutex<FileChannel>> {
        self.file.as_ref()
    }

    /// Swap in a fresh recording file
    ///
    /// Returns `Unsupported` on a streaming sink, which has no file channel.
    pub async fn set_file(&self, path: &Path, recording: bool) -> io::Result<()> {
        match &self.file {
            Some(file) => file.lock().await.set_file(path, recording).await,
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "not a split sink",
            )),
        }
    }

    /// Enable or disable recording; returns `false` if it could not apply
    pub async fn set_recording(&self, on: bool) -> bool {
        match &self.file {
            Some(file) => file.lock().await.set_recording(on),
            None => false,
        }
    }

    /// Flush and sync the recording file ahead of a rotation
    pub async fn sync_file(&self) -> io::Result<()> {
        match &self.file {
            Some(file) => file.lock().await.sync().await,
            None => Ok(()),
        }
    }

    /// Close both destinations unconditionally
    ///
    /// Decrements the active-stream count only if this sink had been counted.
    /// Safe during teardown even if the sink was never bound, and safe to
    /// call twice. The flag is cleared before the net lock is taken so the
    /// connection monitors abort any pump still blocked in a write.
    pub async fn close(&self) {
        self.active.store(false, Ordering::Release);

        if let Some(file) = &self.file {
            file.lock().await.close().await;
        }

        if self.net.lock().await.close().await {
            self.streams.release();
        }
    }
}
