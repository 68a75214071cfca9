// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control plane: OS notifications translated into typed control messages
//! and dispatched serially to registered handlers.
//!
//! Producers are platform listeners (unix signals, windows named pipe);
//! the consumer is a single dispatch task, so handlers never run
//! concurrently. Stop-class notifications are resolved against the shutdown
//! monitor before dispatch: a queued host poweroff upgrades `Stop` to
//! `Shutdown`.

pub mod shutdown;

#[cfg(unix)]
pub mod signals;
#[cfg(windows)]
pub mod pipe;

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lookout_core::Message;

use self::shutdown::{NoopShutdownMonitor, ShutdownMonitor};

/// Budget for the shutdown monitor's reply before falling back to a plain
/// stop. Empirical; racing the OS shutdown target any longer is not safe.
const SHUTDOWN_PROBE_WAIT: Duration = Duration::from_secs(1);

/// Notifications produced by the platform listeners.
#[derive(Debug)]
pub enum Notification {
    /// A fully resolved message (verbose toggle, or an explicit pipe
    /// `shutdown`).
    Message(Message),
    /// Stop-class input; resolved to `Stop` or `Shutdown` via the monitor.
    StopRequested,
    /// Dump runtime diagnostics to the log and continue.
    Diagnostics,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

type MessageHandler = Box<dyn FnMut(Message) -> Result<(), HandlerError> + Send>;

/// Serial dispatcher from OS notifications to registered handlers.
pub struct NotificationHandler {
    handlers: HashMap<Message, Vec<MessageHandler>>,
    tx: mpsc::Sender<Notification>,
    rx: mpsc::Receiver<Notification>,
    monitor: Box<dyn ShutdownMonitor>,
    cancel: CancellationToken,
    terminal_emitted: bool,
}

impl NotificationHandler {
    pub fn new(monitor: Box<dyn ShutdownMonitor>) -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self {
            handlers: HashMap::new(),
            tx,
            rx,
            monitor,
            cancel: CancellationToken::new(),
            terminal_emitted: false,
        }
    }

    /// Sender handed to platform listeners.
    pub fn notifier(&self) -> mpsc::Sender<Notification> {
        self.tx.clone()
    }

    /// Token that stops the dispatch loop.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Bind a handler to a message. Multiple handlers per message run in
    /// registration order.
    pub fn register(
        &mut self,
        message: Message,
        handler: impl FnMut(Message) -> Result<(), HandlerError> + Send + 'static,
    ) {
        self.handlers.entry(message).or_default().push(Box::new(handler));
    }

    /// Run the dispatch loop until the cancel token fires.
    pub async fn start(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                notification = self.rx.recv() => match notification {
                    Some(n) => self.handle(n).await,
                    None => break,
                },
            }
        }
    }

    async fn handle(&mut self, notification: Notification) {
        match notification {
            Notification::Message(message) => {
                if matches!(message, Message::Stop | Message::Shutdown) {
                    self.emit_terminal(message);
                } else {
                    self.dispatch(message);
                }
            }
            Notification::StopRequested => {
                if self.terminal_emitted {
                    debug!("ignoring stop request: terminal message already dispatched");
                    return;
                }
                let message = self.resolve_stop().await;
                self.emit_terminal(message);
            }
            Notification::Diagnostics => log_runtime_diagnostics(),
        }
    }

    /// Resolve a stop-class notification against the shutdown monitor,
    /// waiting at most [`SHUTDOWN_PROBE_WAIT`] for its reply, then tear the
    /// monitor down.
    async fn resolve_stop(&mut self) -> Message {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.monitor.check_shutdown_status(reply_tx).await;
        let message = match tokio::time::timeout(SHUTDOWN_PROBE_WAIT, reply_rx).await {
            Ok(Ok(cmd)) if !cmd.noop => {
                info!("host poweroff in progress, upgrading stop to shutdown");
                Message::Shutdown
            }
            Ok(Ok(_)) => Message::Stop,
            Ok(Err(_)) | Err(_) => {
                debug!("no shutdown status reply within budget, treating as user stop");
                Message::Stop
            }
        };
        self.monitor.stop().await;
        message
    }

    /// Dispatch a terminal message at most once for the process lifetime.
    fn emit_terminal(&mut self, message: Message) {
        if self.terminal_emitted {
            debug!("ignoring {message}: terminal message already dispatched");
            return;
        }
        self.terminal_emitted = true;
        self.dispatch(message);
    }

    fn dispatch(&mut self, message: Message) {
        let Some(handlers) = self.handlers.get_mut(&message) else {
            warn!("no handler registered for control message {message}");
            return;
        };
        for handler in handlers {
            if let Err(e) = handler(message) {
                warn!("control handler for {message} failed: {e}");
            }
        }
    }
}

/// Build the platform shutdown monitor, falling back to noop when the host
/// cannot answer planned-shutdown queries.
pub async fn init_platform_monitor() -> Box<dyn ShutdownMonitor> {
    #[cfg(target_os = "linux")]
    {
        use self::shutdown::ShutdownMonitorError;

        let mut monitor = shutdown::SystemdShutdownMonitor::new();
        match monitor.init().await {
            Ok(()) => return Box::new(monitor),
            Err(ShutdownMonitorError::NoSystemd) => {
                debug!("no systemd on this host, planned shutdowns are indistinguishable");
            }
            Err(e) => warn!("shutdown monitor init failed: {e}"),
        }
    }
    let mut monitor = NoopShutdownMonitor;
    // Noop init cannot fail.
    let _ = monitor.init().await;
    Box::new(monitor)
}

/// SIGQUIT analog of a stack dump: log scheduler-level runtime metrics.
fn log_runtime_diagnostics() {
    let metrics = tokio::runtime::Handle::current().metrics();
    info!(
        workers = metrics.num_workers(),
        alive_tasks = metrics.num_alive_tasks(),
        "runtime diagnostics requested"
    );
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
