//! Recording control and archive rotation
//!
//! Recording is a property of slot 0 only: its split sink always has a file
//! handle open, so a start command takes effect on the very next chunk. The
//! controller consumes [`RecordCommand`]s from a channel; on Unix a small
//! translation task feeds that channel from SIGUSR1/SIGUSR2.
//!
//! Rotation on stop: flush, rename the current file under a timestamped
//! archive name, open a fresh current file. The whole swap holds the slot-0
//! lock so a concurrent encoder write can never hit a half-closed handle.

pub mod controller;
pub mod rotate;
#[cfg(unix)]
pub mod signal;

pub use controller::{RecordCommand, RecorderConfig, RecordState, RecordingController};
pub use rotate::{archive_stem, unique_archive_path, ARCHIVE_TIMESTAMP_FORMAT};
#[cfg(unix)]
pub use signal::spawn_signal_listener;
