//! Sink pool and slot allocation
//!
//! The pool models the hardware's limited number of simultaneous encode
//! channels: a fixed, ordered set of sinks, slot 0 reserved as the split sink
//! that also carries the recording file. Slots are created once at startup
//! and mutated in place for the server's lifetime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::video::VideoSink;
use super::writer::NetHandle;

/// Shared count of sinks holding a live viewer connection
///
/// Incremented on bind, decremented on teardown (clean close or write
/// failure). Allocation does not trust this number for slot choice; each
/// sink's own activity flag decides, so a stale count can never
/// double-assign a slot.
#[derive(Debug, Default)]
pub struct ActiveStreams(AtomicUsize);

impl ActiveStreams {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Current number of live streams
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn acquire(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release(&self) {
        // Saturating: release on a never-counted sink must not wrap
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

/// Result of binding a connection to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// The slot the connection was bound to
    pub slot: usize,
    /// Whether a dedicated encode channel must be started for this slot
    ///
    /// False only for slot 0, whose channel runs permanently so recording
    /// can start at any moment without encoder-attach latency.
    pub starts_channel: bool,
}

/// Fixed-size ordered collection of video sinks
pub struct SinkPool {
    slots: Vec<Arc<VideoSink>>,
    streams: Arc<ActiveStreams>,
}

impl SinkPool {
    /// Create a pool with `capacity` slots (minimum 1)
    ///
    /// Slot 0 is the split sink; the rest are streaming sinks.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let streams = Arc::new(ActiveStreams::new());

        let slots = (0..capacity)
            .map(|i| {
                let sink = if i == 0 {
                    VideoSink::split(i, Arc::clone(&streams))
                } else {
                    VideoSink::streaming(i, Arc::clone(&streams))
                };
                Arc::new(sink)
            })
            .collect();

        Self { slots, streams }
    }

    /// Number of slots in the pool
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots with a live viewer attached
    pub fn active_streams(&self) -> usize {
        self.streams.count()
    }

    /// Shared handle to the active-stream counter
    pub fn streams(&self) -> Arc<ActiveStreams> {
        Arc::clone(&self.streams)
    }

    /// Get a slot's sink by index
    pub fn slot(&self, index: usize) -> Option<Arc<VideoSink>> {
        self.slots.get(index).cloned()
    }

    /// The split sink at slot 0
    pub fn split_sink(&self) -> Arc<VideoSink> {
        Arc::clone(&self.slots[0])
    }

    /// Bind a new viewer connection to a free slot
    ///
    /// Slots fill low-to-high: slot 0 first when free, then the lowest free
    /// streaming slot. Each slot is reserved with a single compare-exchange
    /// on its activity flag, so two racing connections can never share a
    /// slot and the scan never waits on a slot busy writing to its viewer.
    /// A full pool is an explicit rejection, never an out-of-bounds slot.
    pub async fn bind(&self, handle: NetHandle) -> Result<Binding> {
        let mut handle = Some(handle);

        for (index, sink) in self.slots.iter().enumerate() {
            if !sink.claim() {
                continue;
            }

            if let Some(h) = handle.take() {
                sink.bind(h).await;
                return Ok(Binding {
                    slot: index,
                    starts_channel: index != 0,
                });
            }
        }

        Err(Error::PoolExhausted {
            capacity: self.slots.len(),
        })
    }

    /// Close every sink in the pool; part of whole-server teardown
    pub async fn close_all(&self) {
        for sink in &self.slots {
            sink.close().await;
        }
    }
}
