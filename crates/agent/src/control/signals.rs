// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix signal listener.
//!
//! | signal | notification |
//! |--------|--------------|
//! | SIGUSR1 | `EnableVerboseLogging` |
//! | SIGUSR2, SIGINT, SIGTERM | stop-class (upgraded by the dispatcher) |
//! | SIGQUIT | runtime diagnostics dump |

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use lookout_core::Message;

use super::Notification;

/// Subscribe to the agent's signal set and forward notifications until the
/// token fires.
pub fn spawn_signal_listener(
    tx: mpsc::Sender<Notification>,
    cancel: CancellationToken,
) -> std::io::Result<JoinHandle<()>> {
    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;
    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(tokio::spawn(async move {
        loop {
            let notification = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = usr1.recv() => Notification::Message(Message::EnableVerboseLogging),
                _ = usr2.recv() => Notification::StopRequested,
                _ = int.recv() => Notification::StopRequested,
                _ = term.recv() => Notification::StopRequested,
                _ = quit.recv() => Notification::Diagnostics,
            };
            if tx.send(notification).await.is_err() {
                break;
            }
        }
    }))
}
