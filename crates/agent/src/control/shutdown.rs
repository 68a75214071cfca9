// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown monitor: distinguishes a planned host poweroff from a plain
//! user stop.
//!
//! Linux asks systemd over the system bus whether a `poweroff.target` start
//! job is queued. Every other platform has no planned-shutdown signal and
//! always reports noop.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

/// Reply from a shutdown-status check. `noop == false` means a planned
/// shutdown is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShutdownCmd {
    pub noop: bool,
}

#[derive(Debug, Error)]
pub enum ShutdownMonitorError {
    /// The host has no reachable systemd. Callers fall back to the noop
    /// monitor; this is not fatal for the control plane.
    #[error("no systemd")]
    NoSystemd,

    #[error("system bus error: {0}")]
    Bus(String),
}

/// Platform probe for a planned shutdown.
///
/// `check_shutdown_status` may be called at most once between `init` and
/// `stop`; the reply arrives on the provided oneshot. A monitor that cannot
/// answer simply drops the sender and the caller's wait times out.
#[async_trait]
pub trait ShutdownMonitor: Send {
    async fn init(&mut self) -> Result<(), ShutdownMonitorError>;

    async fn check_shutdown_status(&mut self, reply: oneshot::Sender<ShutdownCmd>);

    async fn stop(&mut self);
}

/// Monitor for platforms without a planned-shutdown distinction.
#[derive(Default)]
pub struct NoopShutdownMonitor;

#[async_trait]
impl ShutdownMonitor for NoopShutdownMonitor {
    async fn init(&mut self) -> Result<(), ShutdownMonitorError> {
        Ok(())
    }

    async fn check_shutdown_status(&mut self, reply: oneshot::Sender<ShutdownCmd>) {
        let _ = reply.send(ShutdownCmd { noop: true });
    }

    async fn stop(&mut self) {}
}

#[cfg(target_os = "linux")]
pub use linux::SystemdShutdownMonitor;

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use tracing::warn;
    use zbus::zvariant::OwnedObjectPath;

    /// One queued systemd job as returned by `ListJobs`.
    type ListedJob = (u32, String, String, String, OwnedObjectPath, OwnedObjectPath);

    #[zbus::proxy(
        interface = "org.freedesktop.systemd1.Manager",
        default_service = "org.freedesktop.systemd1",
        default_path = "/org/freedesktop/systemd1",
        gen_blocking = false
    )]
    trait SystemdManager {
        fn list_jobs(&self) -> zbus::Result<Vec<ListedJob>>;
    }

    /// Shutdown monitor backed by the systemd manager on the system bus.
    ///
    /// Honors `DBUS_SYSTEM_BUS_ADDRESS` through the bus library.
    #[derive(Default)]
    pub struct SystemdShutdownMonitor {
        conn: Option<zbus::Connection>,
    }

    impl SystemdShutdownMonitor {
        pub fn new() -> Self {
            Self::default()
        }

        async fn poweroff_queued(conn: &zbus::Connection) -> Result<bool, ShutdownMonitorError> {
            let proxy = SystemdManagerProxy::new(conn)
                .await
                .map_err(|e| ShutdownMonitorError::Bus(e.to_string()))?;
            let jobs = proxy
                .list_jobs()
                .await
                .map_err(|e| ShutdownMonitorError::Bus(e.to_string()))?;
            Ok(jobs
                .iter()
                .any(|(_, unit, job_type, _, _, _)| unit == "poweroff.target" && job_type == "start"))
        }
    }

    #[async_trait]
    impl ShutdownMonitor for SystemdShutdownMonitor {
        async fn init(&mut self) -> Result<(), ShutdownMonitorError> {
            let conn = zbus::Connection::system()
                .await
                .map_err(|_| ShutdownMonitorError::NoSystemd)?;
            self.conn = Some(conn);
            Ok(())
        }

        async fn check_shutdown_status(&mut self, reply: oneshot::Sender<ShutdownCmd>) {
            let Some(conn) = self.conn.as_ref() else {
                // Not initialized; drop the sender so the caller times out
                // onto the plain-stop path.
                return;
            };
            match Self::poweroff_queued(conn).await {
                Ok(queued) => {
                    let _ = reply.send(ShutdownCmd { noop: !queued });
                }
                Err(e) => {
                    warn!("shutdown status probe failed: {e}");
                }
            }
        }

        async fn stop(&mut self) {
            self.conn = None;
        }
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
