// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status and HTTP ingest surface.
//!
//! `GET /v1/status` reports version and uptime, `GET /v1/status/ready` is
//! the liveness probe, `POST /v1/data` accepts an event batch and forwards
//! it through the agent's event sink.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use lookout_core::{AgentContext, Clock, Event, SystemClock};

use super::SurfaceError;

#[derive(Clone)]
struct AppState {
    ctx: AgentContext,
    started: Instant,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    version: &'static str,
    uptime_secs: u64,
    checks_healthy: bool,
}

/// Bind the status surface. Returns the bound address (useful when the
/// configured port is 0) and the listener to pass to [`serve`].
pub async fn bind(host: &str, port: u16) -> Result<(SocketAddr, TcpListener), SurfaceError> {
    let ip: std::net::IpAddr = host
        .parse()
        .map_err(|e: std::net::AddrParseError| SurfaceError::Address(host.to_string(), e.to_string()))?;
    let addr = SocketAddr::from((ip, port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SurfaceError::Bind(addr.to_string(), e))?;
    let bound = listener.local_addr().map_err(|e| SurfaceError::Bind(addr.to_string(), e))?;
    Ok((bound, listener))
}

/// Serve until the context's cancellation token fires.
pub async fn serve(listener: TcpListener, ctx: AgentContext) -> Result<(), SurfaceError> {
    let cancel = ctx.cancel.clone();
    let state = AppState { ctx, started: Instant::now() };
    let app = router(state);
    info!("status surface listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| SurfaceError::Serve(e.to_string()))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/status", get(status))
        .route("/v1/status/ready", get(ready))
        .route("/v1/data", post(ingest))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
        checks_healthy: true,
    })
}

async fn ready() -> &'static str {
    "ok"
}

async fn ingest(State(state): State<AppState>, Json(events): Json<Vec<Event>>) -> StatusCode {
    let key = state.ctx.agent_key();
    let now = SystemClock.epoch_secs();
    for mut event in events {
        event.stamp(now);
        state.ctx.emit_event(event, &key);
    }
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
