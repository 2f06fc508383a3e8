//! MJPEG fan-out and recording server for security camera nodes
//!
//! A camera node runs one hardware encoder producing a continuous sequence of
//! frame-delimited MJPEG chunks. This crate distributes that sequence: live to
//! a capped number of concurrent TCP viewers, and optionally to a rotating
//! recording file controlled by out-of-band start/stop signals.
//!
//! # Architecture
//!
//! ```text
//!   capture pipeline ──► FrameBus (EncoderSource)
//!                            │ one encode channel per attached port
//!              ┌─────────────┼─────────────┐
//!              ▼             ▼             ▼
//!        slot 0 sink    slot 1 sink   slot N-1 sink
//!        (net + file)     (net)          (net)
//!              │  ▲            ▲
//!     viewers ─┘  │            └─ VideoServer binds accepted connections
//!                 │
//!        RecordingController: SIGUSR1/SIGUSR2 ──► start/stop + rotation
//! ```
//!
//! # Example
//!
//! ```no_run
//! use splitcast::{
//!     FrameBus, RecorderConfig, RecordingController, ServerConfig, VideoServer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> splitcast::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = VideoServer::new(config.clone(), FrameBus::new(config.max_streams));
//!
//!     let (controller, _commands) =
//!         RecordingController::new(server.split_sink(), RecorderConfig::default());
//!     controller.init().await?;
//!     tokio::spawn(controller.run());
//!
//!     server.run().await
//! }
//! ```

pub mod encoder;
pub mod error;
pub mod recorder;
pub mod server;
pub mod sink;
pub mod stats;

pub use encoder::{spawn_encode_channel, EncoderSource, FrameBus};
pub use error::{Error, Result};
pub use recorder::{RecordCommand, RecorderConfig, RecordState, RecordingController};
#[cfg(unix)]
pub use recorder::spawn_signal_listener;
pub use server::{ServerConfig, VideoServer};
pub use sink::{ActiveStreams, Binding, SinkPool, VideoSink};
pub use stats::ServerStats;
