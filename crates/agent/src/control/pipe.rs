// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Windows named-pipe listener.
//!
//! Accepts single-line ASCII messages on `\\.\pipe\lookout-agent`;
//! `notification`, `stop`, and `shutdown` map to the control message set.
//! Unknown text is logged and ignored.

use tokio::io::AsyncReadExt;
use tokio::net::windows::named_pipe::{NamedPipeServer, ServerOptions};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use lookout_core::Message;

use super::Notification;

pub const PIPE_PATH: &str = r"\\.\pipe\lookout-agent";

/// Accept pipe clients and forward notifications until the token fires.
pub fn spawn_pipe_listener(
    tx: mpsc::Sender<Notification>,
    cancel: CancellationToken,
) -> std::io::Result<JoinHandle<()>> {
    let mut server = ServerOptions::new().first_pipe_instance(true).create(PIPE_PATH)?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                connected = server.connect() => {
                    if let Err(e) = connected {
                        error!("pipe accept error: {e}");
                        continue;
                    }
                    let client = match ServerOptions::new().create(PIPE_PATH) {
                        Ok(next) => std::mem::replace(&mut server, next),
                        Err(e) => {
                            error!("pipe re-create error: {e}");
                            break;
                        }
                    };
                    if let Some(notification) = read_message(client).await {
                        if tx.send(notification).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }))
}

/// Read one newline-terminated message from a connected client.
async fn read_message(mut client: NamedPipeServer) -> Option<Notification> {
    let mut buf = Vec::with_capacity(64);
    let mut byte = [0u8; 1];
    loop {
        match client.read(&mut byte).await {
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => buf.push(byte[0]),
            Err(e) => {
                warn!("pipe read error: {e}");
                return None;
            }
        }
    }
    let text = String::from_utf8_lossy(&buf);
    match text.parse::<Message>() {
        Ok(Message::EnableVerboseLogging) => {
            Some(Notification::Message(Message::EnableVerboseLogging))
        }
        Ok(Message::Stop) => Some(Notification::StopRequested),
        Ok(Message::Shutdown) => Some(Notification::Message(Message::Shutdown)),
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}
