// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP ingest: newline-delimited JSON events on a local socket, forwarded
//! through the agent's event sink.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

use lookout_core::{AgentContext, Clock, Event, SystemClock};

use super::SurfaceError;

/// Bind the ingest socket on loopback.
pub async fn bind(port: u16) -> Result<(SocketAddr, TcpListener), SurfaceError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SurfaceError::Bind(addr.to_string(), e))?;
    let bound = listener.local_addr().map_err(|e| SurfaceError::Bind(addr.to_string(), e))?;
    Ok((bound, listener))
}

/// Accept connections until the context's cancellation token fires.
pub async fn serve(listener: TcpListener, ctx: AgentContext) {
    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "ingest connection");
                    let ctx = ctx.clone();
                    tokio::spawn(async move { handle_connection(stream, ctx).await });
                }
                Err(e) => error!("ingest accept error: {e}"),
            },
        }
    }
}

/// Read events line by line; malformed lines are logged and skipped.
async fn handle_connection(stream: TcpStream, ctx: AgentContext) {
    let key = ctx.agent_key();
    let mut lines = BufReader::new(stream).lines();
    loop {
        let line = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("ingest read error: {e}");
                    break;
                }
            },
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(&line) {
            Ok(mut event) => {
                event.stamp(SystemClock.epoch_secs());
                ctx.emit_event(event, &key);
            }
            Err(e) => warn!("dropping malformed ingest line: {e}"),
        }
    }
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
