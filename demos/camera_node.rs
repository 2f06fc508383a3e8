//! Camera node - full wiring of the video distribution server
//!
//! Run with: cargo run --example camera_node -- [video_dir]
//!
//! This example demonstrates:
//! - Serving live MJPEG to viewers over raw TCP (`nc <host> 10000 > out.mjpeg`)
//! - Recording control via OS signals: `kill -USR1 <pid>` starts recording,
//!   `kill -USR2 <pid>` stops it and rotates the archive
//! - PID file handling for process supervision
//!
//! The synthetic frame ticker stands in for the capture pipeline; a real node
//! publishes its encoder's output into the same `FrameBus`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use splitcast::{FrameBus, RecorderConfig, RecordingController, ServerConfig, VideoServer};

/// A stand-in MJPEG frame: JPEG SOI marker, padding, EOI marker
fn synthetic_frame(sequence: u64) -> Bytes {
    let mut frame = vec![0xFF, 0xD8];
    frame.extend_from_slice(&sequence.to_be_bytes());
    frame.extend(std::iter::repeat(0x00).take(512));
    frame.extend_from_slice(&[0xFF, 0xD9]);
    Bytes::from(frame)
}

fn write_pid_file(run_dir: &PathBuf) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(run_dir)?;
    let pid_path = run_dir.join("splitcast.pid");
    std::fs::write(&pid_path, std::process::id().to_string())?;
    Ok(pid_path)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("splitcast=info".parse()?),
        )
        .init();

    // Recording directory (./videos by default)
    let video_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("videos"));

    let pid_path = write_pid_file(&PathBuf::from("run"))?;

    let config = ServerConfig::default();
    let server = Arc::new(VideoServer::new(
        config.clone(),
        FrameBus::new(config.max_streams),
    ));

    // Recording controller gets the slot-0 sink directly; signals only feed
    // its command channel
    let recorder_config = RecorderConfig::default().video_dir(&video_dir);
    let (controller, commands) = RecordingController::new(server.split_sink(), recorder_config);
    controller.init().await?;
    tokio::spawn(controller.run());

    #[cfg(unix)]
    splitcast::spawn_signal_listener(commands)?;
    #[cfg(not(unix))]
    drop(commands);

    // Synthetic capture pipeline: ~30 fps of placeholder frames
    let producer = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(33));
            let mut sequence = 0u64;
            loop {
                ticker.tick().await;
                server.encoder().publish(synthetic_frame(sequence));
                sequence += 1;
            }
        })
    };

    println!("Camera Node");
    println!("===========");
    println!("PID file:     {} (pid {})", pid_path.display(), std::process::id());
    println!("Listening on: {}", server.bind_addr());
    println!("Video dir:    {}", video_dir.display());
    println!();
    println!("Watch the stream:     nc 127.0.0.1 {} > live.mjpeg", server.bind_addr().port());
    println!("Start recording:      kill -USR1 {}", std::process::id());
    println!("Stop and archive:     kill -USR2 {}", std::process::id());
    println!();
    println!("Press Ctrl+C to stop the server...");
    println!();

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    producer.abort();
    server.close().await;
    let _ = std::fs::remove_file(&pid_path);

    Ok(())
}
