//! Writer capabilities for the two sink destinations
//!
//! A sink writes to up to two independently failing destinations: a live
//! network connection and a recording file. Each destination is its own type
//! with its own failure handling, so a disconnecting viewer never interrupts
//! the recording and a disk error never interrupts live viewers. The
//! [`VideoSink`](super::VideoSink) dispatcher combines them, giving each
//! destination its own lock.

use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Boxed network write handle
///
/// Usually the write half of a `TcpStream`; tests substitute an in-memory
/// duplex endpoint.
pub type NetHandle = Box<dyn AsyncWrite + Send + Unpin>;

/// The network-facing side of a sink: at most one live viewer connection
///
/// Holds only the handle; liveness is tracked lock-free by the owning sink
/// so slot allocation and the connection monitors never wait on a write in
/// progress.
pub struct NetChannel {
    handle: Option<NetHandle>,
}

impl NetChannel {
    /// Create a channel with no connection attached
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Whether a handle is attached
    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Attach a new write handle, shutting down any previous one
    ///
    /// Returns `true` if a handle was already attached (a re-bind).
    pub async fn attach(&mut self, handle: NetHandle) -> bool {
        let had_handle = if let Some(mut old) = self.handle.take() {
            let _ = old.shutdown().await;
            true
        } else {
            false
        };

        self.handle = Some(handle);
        had_handle
    }

    /// Write one chunk to the attached connection, if any
    ///
    /// A failed write is the one and only path that closes the handle due to
    /// an error: the handle is shut down and taken, and the error is returned
    /// so the caller can settle its bookkeeping. Later writes on the same
    /// channel are no-ops.
    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let result = match self.handle.as_mut() {
            Some(handle) => handle.write_all(chunk).await,
            None => return Ok(()),
        };

        if let Err(e) = result {
            if let Some(mut handle) = self.handle.take() {
                let _ = handle.shutdown().await;
            }
            return Err(e);
        }

        Ok(())
    }

    /// Flush the attached connection; a missing handle is not an error
    pub async fn flush(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            let _ = handle.flush().await;
        }
    }

    /// Unconditionally close the channel
    ///
    /// Returns `true` if a handle was actually attached, so the caller knows
    /// whether this teardown releases a counted stream. Safe to call twice.
    pub async fn close(&mut self) -> bool {
        if let Some(mut handle) = self.handle.take() {
            let _ = handle.shutdown().await;
            true
        } else {
            false
        }
    }
}

impl Default for NetChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// The file-facing side of a split sink
///
/// The file handle's lifecycle is independent of the network handle: either
/// can be present without the other. Only the recording controller swaps the
/// file during rotation.
pub struct FileChannel {
    file: Option<File>,
    recording: bool,
}

impl FileChannel {
    /// Create a channel with no file open and recording off
    pub fn new() -> Self {
        Self {
            file: None,
            recording: false,
        }
    }

    /// Create a channel around an existing handle; test fixtures use this to
    /// inject handles whose writes fail
    pub(crate) fn with_handle(file: File, recording: bool) -> Self {
        Self {
            file: Some(file),
            recording,
        }
    }

    /// Whether writes currently land in the file
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Whether a file handle is open
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Open a fresh file at `path`, closing (and flushing) any previous one
    pub async fn set_file(&mut self, path: &Path, recording: bool) -> io::Result<()> {
        if let Some(mut old) = self.file.take() {
            let _ = old.flush().await;
        }

        self.file = Some(File::create(path).await?);
        self.recording = recording;
        Ok(())
    }

    /// Enable or disable recording on the current file handle
    ///
    /// Returns `false` if no file is open (recording cannot start).
    pub fn set_recording(&mut self, on: bool) -> bool {
        if on && self.file.is_none() {
            return false;
        }
        self.recording = on;
        true
    }

    /// Write one chunk to the file, if open and recording
    ///
    /// A file write failure invalidates the handle and disables recording;
    /// the error is returned for logging but subsequent writes are no-ops.
    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if !self.recording {
            return Ok(());
        }

        let result = match self.file.as_mut() {
            Some(file) => file.write_all(chunk).await,
            None => return Ok(()),
        };

        if let Err(e) = result {
            self.file = None;
            self.recording = false;
            return Err(e);
        }

        Ok(())
    }

    /// Flush the file, if open and recording
    pub async fn flush(&mut self) {
        if !self.recording {
            return;
        }
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush().await;
        }
    }

    /// Flush regardless of the recording flag; used before rotation
    pub async fn sync(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    /// Close the file handle and clear the recording flag. Safe to call twice.
    pub async fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush().await;
        }
        self.recording = false;
    }
}

impl Default for FileChannel {
    fn default() -> Self {
        Self::new()
    }
}
