// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command channel: a polled remote control plane.
//!
//! Each iteration POSTs the agent identity to the command endpoint, decodes
//! an ordered list of typed commands, and dispatches them to registered
//! handlers. A server-supplied backoff stretches the next tick.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lookout_core::identity::{AgentIdentity, IdentityProvider};

/// One remote command. `arguments` stays opaque until the named handler
/// decodes it.
#[derive(Clone, Debug, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Wire shape of the endpoint's response. The envelope form is canonical;
/// a bare array is accepted for older servers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CommandResponse {
    Enveloped { return_value: Vec<Command> },
    Bare(Vec<Command>),
}

impl CommandResponse {
    pub fn into_commands(self) -> Vec<Command> {
        match self {
            CommandResponse::Enveloped { return_value } => return_value,
            CommandResponse::Bare(commands) => commands,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure; retried on the next tick.
    #[error("command channel unreachable: {0}")]
    Network(String),

    /// Server rejected the request; the batch is dropped.
    #[error("command channel returned status {0}")]
    Status(u16),

    /// Body did not decode; the batch is dropped.
    #[error("cannot decode command response: {0}")]
    Decode(String),
}

/// Seam over the HTTP endpoint so the service is testable offline.
#[async_trait]
pub trait CommandApi: Send + Sync {
    async fn fetch(&self, identity: &AgentIdentity) -> Result<Vec<Command>, FetchError>;
}

/// Production client for `${command_channel_url}${command_channel_endpoint}`.
pub struct HttpCommandApi {
    client: reqwest::Client,
    url: String,
}

impl HttpCommandApi {
    pub fn new(client: reqwest::Client, base_url: &str, endpoint: &str) -> Self {
        Self { client, url: format!("{base_url}{endpoint}") }
    }
}

#[async_trait]
impl CommandApi for HttpCommandApi {
    async fn fetch(&self, identity: &AgentIdentity) -> Result<Vec<Command>, FetchError> {
        let body = serde_json::json!({ "agent_id": identity.agent_id });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let decoded: CommandResponse =
            response.json().await.map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(decoded.into_commands())
    }
}

/// Handler invoked with a command's opaque payload.
pub type CommandHandler = Arc<dyn Fn(&Value) -> Result<(), HandlerError> + Send + Sync>;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

/// One-slot channel carrying a server-requested backoff in seconds.
///
/// The backoff command handler writes it; the poll loop reads it
/// non-blockingly after each iteration.
pub struct BackoffSlot(mpsc::Sender<u64>);

impl BackoffSlot {
    /// Record a requested wait. A pending, unread request wins; later
    /// requests within the same tick are dropped.
    pub fn request(&self, seconds: u64) {
        let _ = self.0.try_send(seconds);
    }
}

/// The polling service.
pub struct CommandChannelService {
    api: Arc<dyn CommandApi>,
    identity: Arc<dyn IdentityProvider>,
    handlers: HashMap<String, CommandHandler>,
    interval: Duration,
    backoff_tx: mpsc::Sender<u64>,
    backoff_rx: mpsc::Receiver<u64>,
}

impl CommandChannelService {
    pub fn new(
        api: Arc<dyn CommandApi>,
        identity: Arc<dyn IdentityProvider>,
        interval: Duration,
    ) -> Self {
        let (backoff_tx, backoff_rx) = mpsc::channel(1);
        Self { api, identity, handlers: HashMap::new(), interval, backoff_tx, backoff_rx }
    }

    /// Handle for the `backoff_command_channel` handler.
    pub fn backoff_slot(&self) -> BackoffSlot {
        BackoffSlot(self.backoff_tx.clone())
    }

    /// Register a handler under a command name. Registration happens during
    /// boot; lookups are read-only afterwards.
    pub fn register_handler(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    /// One synchronous fetch before the loop starts. Errors are non-fatal;
    /// a delivered backoff governs the first tick.
    pub async fn initial_fetch(&mut self) {
        match self.api.fetch(&self.identity.identity()).await {
            Ok(commands) => self.apply(commands),
            Err(e) => warn!("initial command fetch failed: {e}"),
        }
    }

    /// Poll until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let wait = self.next_wait();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
            match self.api.fetch(&self.identity.identity()).await {
                Ok(commands) => self.apply(commands),
                Err(FetchError::Network(e)) => debug!("command poll failed, will retry: {e}"),
                Err(e @ (FetchError::Status(_) | FetchError::Decode(_))) => {
                    warn!("command poll dropped: {e}");
                }
            }
        }
    }

    /// Next tick delay: the configured interval, stretched by a pending
    /// server backoff if one arrived since the last read.
    fn next_wait(&mut self) -> Duration {
        match self.backoff_rx.try_recv() {
            Ok(seconds) => self.interval.max(Duration::from_secs(seconds)),
            Err(_) => self.interval,
        }
    }

    /// Apply commands in server order. Handler errors are reported and do
    /// not abort the batch.
    fn apply(&self, commands: Vec<Command>) {
        for command in commands {
            match self.handlers.get(&command.name) {
                Some(handler) => {
                    if let Err(e) = handler(&command.arguments) {
                        warn!(command = %command.name, id = command.id, "command handler failed: {e}");
                    }
                }
                None => warn!(command = %command.name, "no handler registered"),
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
