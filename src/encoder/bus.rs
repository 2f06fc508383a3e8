//! In-process frame bus
//!
//! The reference [`EncoderSource`] implementation: a broadcast channel that a
//! capture pipeline publishes each encoded chunk into once. `bytes::Bytes`
//! is reference-counted, so fan-out to every attached port shares one
//! allocation.

use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::error::{Error, Result};

use super::EncoderSource;

/// Default number of chunks a slow port may fall behind before dropping
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Broadcast-backed encoder source
pub struct FrameBus {
    tx: Mutex<Option<broadcast::Sender<Bytes>>>,
    attached: Mutex<Vec<bool>>,
}

impl FrameBus {
    /// Create a bus with `ports` splitter ports and the default backlog
    pub fn new(ports: usize) -> Self {
        Self::with_capacity(ports, DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus with an explicit per-port backlog capacity
    pub fn with_capacity(ports: usize, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx: Mutex::new(Some(tx)),
            attached: Mutex::new(vec![false; ports.max(1)]),
        }
    }

    /// Publish one encoded chunk to every attached port
    ///
    /// Returns the number of receivers that got the chunk; zero after
    /// [`shutdown`](Self::shutdown).
    pub fn publish(&self, chunk: Bytes) -> usize {
        match self.tx.lock() {
            Ok(tx) => match tx.as_ref() {
                Some(tx) => tx.send(chunk).unwrap_or(0),
                None => 0,
            },
            Err(_) => 0,
        }
    }

    /// Stop the bus for good, as a dead camera would
    ///
    /// Every encode channel observes the closed stream and exits; the server
    /// treats the permanent slot-0 channel finishing as fatal.
    pub fn shutdown(&self) {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
        tracing::error!("Frame bus shut down");
    }

    /// Number of currently attached ports
    pub fn attached_ports(&self) -> usize {
        match self.attached.lock() {
            Ok(attached) => attached.iter().filter(|a| **a).count(),
            Err(_) => 0,
        }
    }
}

impl EncoderSource for FrameBus {
    fn ports(&self) -> usize {
        self.attached.lock().map(|a| a.len()).unwrap_or(0)
    }

    fn attach(&self, port: usize) -> Result<broadcast::Receiver<Bytes>> {
        let tx = self.tx.lock().map_err(|_| Error::EncoderStopped)?;
        let tx = tx.as_ref().ok_or(Error::EncoderStopped)?;

        let mut attached = self.attached.lock().map_err(|_| Error::EncoderStopped)?;
        match attached.get_mut(port) {
            Some(slot) => {
                *slot = true;
                Ok(tx.subscribe())
            }
            None => Err(Error::PortOutOfRange(port)),
        }
    }

    fn detach(&self, port: usize) {
        if let Ok(mut attached) = self.attached.lock() {
            if let Some(slot) = attached.get_mut(port) {
                *slot = false;
            }
        }
        tracing::debug!(port, "Encoder port detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_detach_bookkeeping() {
        let bus = FrameBus::new(4);
        assert_eq!(bus.ports(), 4);
        assert_eq!(bus.attached_ports(), 0);

        let _rx0 = bus.attach(0).unwrap();
        let _rx2 = bus.attach(2).unwrap();
        assert_eq!(bus.attached_ports(), 2);

        bus.detach(2);
        assert_eq!(bus.attached_ports(), 1);
    }

    #[tokio::test]
    async fn test_attach_out_of_range() {
        let bus = FrameBus::new(4);
        let err = bus.attach(4).unwrap_err();
        assert!(matches!(err, Error::PortOutOfRange(4)));
    }

    #[tokio::test]
    async fn test_every_port_sees_same_sequence() {
        let bus = FrameBus::new(2);
        let mut rx0 = bus.attach(0).unwrap();
        let mut rx1 = bus.attach(1).unwrap();

        bus.publish(Bytes::from_static(b"one"));
        bus.publish(Bytes::from_static(b"two"));

        for rx in [&mut rx0, &mut rx1] {
            assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"one"));
            assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"two"));
        }
    }

    #[tokio::test]
    async fn test_publish_without_receivers() {
        let bus = FrameBus::new(2);
        assert_eq!(bus.publish(Bytes::from_static(b"frame")), 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_receivers_and_blocks_attach() {
        let bus = FrameBus::new(2);
        let mut rx = bus.attach(0).unwrap();

        bus.shutdown();

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert_eq!(bus.publish(Bytes::from_static(b"frame")), 0);
        assert!(matches!(bus.attach(1), Err(Error::EncoderStopped)));
    }
}
