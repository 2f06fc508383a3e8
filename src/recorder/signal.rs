//! OS signal translation for recording control
//!
//! SIGUSR1 starts recording, SIGUSR2 stops it. The signals carry no payload
//! and get no acknowledgment; they are translated into [`RecordCommand`]s on
//! the controller's channel and nothing else.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

use super::RecordCommand;

/// Spawn the task forwarding SIGUSR1/SIGUSR2 to the recording controller
pub fn spawn_signal_listener(tx: mpsc::Sender<RecordCommand>) -> Result<JoinHandle<()>> {
    let mut start = signal(SignalKind::user_defined1())?;
    let mut stop = signal(SignalKind::user_defined2())?;

    Ok(tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                received = start.recv() => match received {
                    Some(()) => RecordCommand::Start,
                    None => break,
                },
                received = stop.recv() => match received {
                    Some(()) => RecordCommand::Stop,
                    None => break,
                },
            };

            if tx.send(command).await.is_err() {
                // Controller gone; nothing left to signal
                break;
            }
        }
    }))
}
