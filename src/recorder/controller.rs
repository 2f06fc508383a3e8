//! Recording controller
//!
//! Drives the slot-0 recording state machine from an explicit command
//! channel, outside the normal connection path. The trigger mechanism (OS
//! signals, local IPC) only feeds commands into the channel; the state
//! machine lives here.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::sink::VideoSink;

use super::rotate;

/// Control commands accepted by the recording controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordCommand {
    /// Begin writing chunks into the current file
    Start,
    /// Stop writing and rotate the current file into the archive
    Stop,
}

/// Recording state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Chunks pass the split sink's file side untouched
    NotRecording,
    /// Chunks are written to the current file
    Recording,
}

/// Recording controller configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory holding the current file and the rotated archives
    pub video_dir: PathBuf,

    /// Filename of the mutable current file within `video_dir`
    pub current_name: String,

    /// Extension for archive filenames
    pub archive_extension: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("/var/backups/videos"),
            current_name: "current.mjpeg".to_string(),
            archive_extension: "mjpeg".to_string(),
        }
    }
}

impl RecorderConfig {
    /// Set the video directory
    pub fn video_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.video_dir = dir.into();
        self
    }

    /// Set the current filename
    pub fn current_name(mut self, name: impl Into<String>) -> Self {
        self.current_name = name.into();
        self
    }

    /// Full path of the current file
    pub fn current_path(&self) -> PathBuf {
        self.video_dir.join(&self.current_name)
    }
}

/// Default backlog of the record command channel
const COMMAND_BACKLOG: usize = 8;

/// Signal-driven toggle for slot-0 recording, with archive rotation on stop
pub struct RecordingController {
    sink: Arc<VideoSink>,
    config: RecorderConfig,
    state: RecordState,
    rx: mpsc::Receiver<RecordCommand>,
}

impl RecordingController {
    /// Create a controller for the split sink, returning its command sender
    pub fn new(
        sink: Arc<VideoSink>,
        config: RecorderConfig,
    ) -> (Self, mpsc::Sender<RecordCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_BACKLOG);
        let controller = Self {
            sink,
            config,
            state: RecordState::NotRecording,
            rx,
        };
        (controller, tx)
    }

    /// Current state machine state
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Create the video directory and open the initial current file
    ///
    /// The split sink's file handle exists from startup with recording off,
    /// so a start command never waits on encoder attachment.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.video_dir).await?;

        let current = self.config.current_path();
        self.sink.set_file(&current, false).await?;

        tracing::info!(current = %current.display(), "Recording controller ready");
        Ok(())
    }

    /// Consume commands until the channel closes
    pub async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            if let Err(e) = self.handle(command).await {
                tracing::error!(?command, error = %e, "Record command failed");
            }
        }
        tracing::debug!("Record command channel closed");
    }

    /// Apply a single command to the state machine
    pub async fn handle(&mut self, command: RecordCommand) -> Result<()> {
        match command {
            RecordCommand::Start => self.start().await,
            RecordCommand::Stop => self.stop().await,
        }
    }

    async fn start(&mut self) -> Result<()> {
        if self.state == RecordState::Recording {
            tracing::debug!("Start-recording while already recording, ignored");
            return Ok(());
        }

        if self.sink.set_recording(true).await {
            self.state = RecordState::Recording;
            tracing::info!("Recording started");
        } else {
            tracing::warn!("Recording start refused, no current file open");
        }

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state == RecordState::NotRecording {
            tracing::debug!("Stop-recording while not recording, ignored");
            return Ok(());
        }

        // Recording ends here no matter how the rotation below fares; the
        // state must agree with the sink's flag or a later start command
        // would be ignored while nothing records.
        self.state = RecordState::NotRecording;

        let Some(file) = self.sink.file_channel() else {
            tracing::warn!("Stop-recording on a sink with no file channel");
            return Ok(());
        };

        // Hold the file lock across the whole rotation so the handle swap
        // cannot interleave with an in-flight write from the encoder. The
        // network side has its own lock and is never touched here, so a
        // stalled viewer cannot delay the rotation.
        let mut file = file.lock().await;

        file.set_recording(false);
        file.sync().await?;

        let current = self.config.current_path();
        let rotated = rotate::rotate_current(
            &current,
            &self.config.video_dir,
            &self.config.archive_extension,
        )
        .await?;

        match &rotated {
            Some(archive) => {
                tracing::info!(archive = %archive.display(), "Recording archived")
            }
            None => tracing::warn!("Stop-recording with no current file on disk"),
        }

        file.set_file(&current, false).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ActiveStreams;
    use std::time::Duration;

    fn split_sink() -> Arc<VideoSink> {
        Arc::new(VideoSink::split(0, Arc::new(ActiveStreams::new())))
    }

    fn config(dir: &tempfile::TempDir) -> RecorderConfig {
        RecorderConfig::default().video_dir(dir.path())
    }

    #[tokio::test]
    async fn test_record_three_chunks_and_rotate() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (mut controller, _tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        controller.handle(RecordCommand::Start).await.unwrap();
        assert_eq!(controller.state(), RecordState::Recording);

        for chunk in [b"one" as &[u8], b"two", b"three"] {
            sink.write(chunk).await;
        }

        controller.handle(RecordCommand::Stop).await.unwrap();
        assert_eq!(controller.state(), RecordState::NotRecording);
        assert!(!sink.is_recording().await);

        // Exactly one archive, containing exactly the three chunks
        let current = dir.path().join("current.mjpeg");
        let archives: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| *p != current)
            .collect();
        assert_eq!(archives.len(), 1);
        assert_eq!(std::fs::read(&archives[0]).unwrap(), b"onetwothree");

        let name = archives[0].file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(".mjpeg"));
        assert_eq!(name.len(), "2026-03-14_09-26-53.mjpeg".len());

        // A fresh, empty current file took its place
        assert_eq!(std::fs::read(&current).unwrap(), b"");
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (mut controller, _tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        controller.handle(RecordCommand::Start).await.unwrap();
        sink.write(b"chunk").await;
        controller.handle(RecordCommand::Start).await.unwrap();

        // No rotation happened: only the current file exists
        assert_eq!(controller.state(), RecordState::Recording);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_stop_without_recording_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (mut controller, _tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        controller.handle(RecordCommand::Stop).await.unwrap();

        assert_eq!(controller.state(), RecordState::NotRecording);
        // No rename: the current file is still the only entry
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_rotation_still_ends_recording() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (mut controller, _tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        controller.handle(RecordCommand::Start).await.unwrap();
        sink.write(b"chunk").await;

        // Pull the directory out from under the rotation
        std::fs::remove_dir_all(dir.path()).unwrap();
        assert!(controller.handle(RecordCommand::Stop).await.is_err());

        // The state machine and the sink agree: recording is over
        assert_eq!(controller.state(), RecordState::NotRecording);
        assert!(!sink.is_recording().await);

        // And the controller recovers once the directory is back
        controller.init().await.unwrap();
        controller.handle(RecordCommand::Start).await.unwrap();
        assert_eq!(controller.state(), RecordState::Recording);
        assert!(sink.is_recording().await);
    }

    #[tokio::test]
    async fn test_toggle_works_while_viewer_write_is_stalled() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (mut controller, _tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        // A viewer that never reads: the pump's network write parks inside
        // slot 0's net lock
        let (client, _silent_peer) = tokio::io::duplex(64);
        sink.bind(Box::new(client)).await;

        let stalled = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                loop {
                    sink.write(&[0u8; 4096]).await;
                }
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!stalled.is_finished());

        // Both commands complete promptly regardless
        tokio::time::timeout(Duration::from_secs(1), async {
            controller.handle(RecordCommand::Start).await.unwrap();
            assert_eq!(controller.state(), RecordState::Recording);
            controller.handle(RecordCommand::Stop).await.unwrap();
            assert_eq!(controller.state(), RecordState::NotRecording);
        })
        .await
        .unwrap();

        stalled.abort();
    }

    #[tokio::test]
    async fn test_two_rotations_in_same_second_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (mut controller, _tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        for payload in [b"first" as &[u8], b"second"] {
            controller.handle(RecordCommand::Start).await.unwrap();
            sink.write(payload).await;
            controller.handle(RecordCommand::Stop).await.unwrap();
        }

        let current = dir.path().join("current.mjpeg");
        let archives: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| *p != current)
            .collect();
        assert_eq!(archives.len(), 2);
        assert_ne!(archives[0], archives[1]);
    }

    #[tokio::test]
    async fn test_run_consumes_commands_from_channel() {
        let dir = tempfile::tempdir().unwrap();
        let sink = split_sink();
        let (controller, tx) = RecordingController::new(Arc::clone(&sink), config(&dir));
        controller.init().await.unwrap();

        let task = tokio::spawn(controller.run());

        tx.send(RecordCommand::Start).await.unwrap();

        // Wait for the flag to flip on the sink
        for _ in 0..50 {
            if sink.is_recording().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(sink.is_recording().await);

        drop(tx);
        task.await.unwrap();
    }
}
