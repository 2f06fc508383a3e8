//! Output sinks and the sink pool
//!
//! Every encoded chunk the encoder produces is pushed into one or more sinks.
//! A sink owns up to two independently failing destinations: the live viewer
//! connection and, for slot 0 only, the recording file.
//!
//! # Architecture
//!
//! ```text
//!                 SinkPool (capacity = splitter ports, e.g. 4)
//!      ┌──────────────────────────────────────────────────────┐
//!      │ slot 0: VideoSink { net, file }   <- split sink      │
//!      │ slot 1: VideoSink { net }                            │
//!      │ slot 2: VideoSink { net }                            │
//!      │ slot 3: VideoSink { net }                            │
//!      └──────────────────────────────────────────────────────┘
//!            ▲ write(chunk)            ▲ bind / set_file
//!       encode channels          dispatcher / recording controller
//! ```
//!
//! Each destination inside a sink carries its own `tokio::sync::Mutex`, so
//! handle swaps (viewer bind, file rotation) serialize against in-flight
//! writes to that destination and a write can never observe a half-closed
//! handle. The locks are per destination on purpose: a viewer socket that
//! stops reading stalls only its own slot's network writes, while slot
//! allocation, the connection monitors, and the recording controller keep
//! running off the lock-free activity flag and the file-side lock.

pub mod pool;
pub mod video;
pub mod writer;

pub use pool::{ActiveStreams, Binding, SinkPool};
pub use video::VideoSink;
pub use writer::{FileChannel, NetChannel, NetHandle};
